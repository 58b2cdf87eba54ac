//! Transition rules of the per-user conversation.
//!
//! Flow: `phone` → `after_phone` → `choose_grade` → `rating_subjects` → `finished`.
//! A restart command returns any stage to `phone`. Every function here mutates
//! exactly one record and never touches storage; persisting the result is the
//! caller's concern.

use tracing::{debug, error, warn};

use crate::conversation::events::{Callback, Grade, InboundEvent};
use crate::conversation::keyboards;
use crate::conversation::messages::{self, InstitutionKind};
use crate::conversation::recommend::recommend;
use crate::conversation::validation::{is_restart_command, normalize_phone};
use crate::conversation::Reply;
use crate::models::reference::Institution;
use crate::models::user::{Stage, UserRecord};
use crate::reference::ReferenceSource;

/// Collaborators the transitions read from.
pub struct MachineContext<'a> {
    pub references: &'a dyn ReferenceSource,
    pub payment_details: &'a str,
}

/// Applies one inbound event to `record` and returns the reply to deliver.
pub fn apply(record: &mut UserRecord, event: &InboundEvent, ctx: &MachineContext<'_>) -> Reply {
    match event {
        InboundEvent::Text(text) => on_text(record, text, ctx),
        InboundEvent::Button(callback) => on_button(record, callback, ctx),
    }
}

fn on_text(record: &mut UserRecord, text: &str, ctx: &MachineContext<'_>) -> Reply {
    if is_restart_command(text) {
        return restart(record);
    }

    match record.stage {
        Stage::Phone => match normalize_phone(text) {
            Ok(phone) => {
                let reply = Reply::send(
                    messages::payment_instructions(ctx.payment_details, &phone),
                    Some(keyboards::check_payment()),
                );
                record.phone = Some(phone);
                record.stage = Stage::AfterPhone;
                reply
            }
            Err(e) => {
                debug!("Phone rejected: {e}");
                Reply::send(messages::PHONE_REPROMPT, None)
            }
        },
        _ => Reply::send(messages::BUTTONS_ONLY, None),
    }
}

/// Back to the phone step. `paid`, `phone` and rating history stay as they are.
fn restart(record: &mut UserRecord) -> Reply {
    record.stage = Stage::Phone;
    Reply::send(messages::WELCOME, Some(keyboards::phone_prompt()))
}

fn on_button(record: &mut UserRecord, callback: &Callback, ctx: &MachineContext<'_>) -> Reply {
    match (record.stage, callback) {
        (Stage::AfterPhone, Callback::CheckPaid) => check_paid(record),
        (Stage::ChooseGrade, Callback::Grade(grade)) => choose_grade(record, *grade, ctx),
        (Stage::RatingSubjects, Callback::Rate { subject, score }) => {
            rate_subject(record, subject, *score, ctx)
        }
        (stage, callback) => {
            debug!("Ignoring button '{}' in stage {stage}", callback.encode());
            Reply::edit(messages::STALE_BUTTON, None)
        }
    }
}

fn check_paid(record: &mut UserRecord) -> Reply {
    if record.paid {
        record.stage = Stage::ChooseGrade;
        Reply::edit(messages::PAYMENT_CONFIRMED, Some(keyboards::grade_choice()))
    } else {
        Reply::edit(messages::PAYMENT_PENDING, Some(keyboards::check_payment()))
    }
}

fn choose_grade(record: &mut UserRecord, grade: Grade, ctx: &MachineContext<'_>) -> Reply {
    // Load before mutating so a missing table leaves the record untouched.
    let rules = match ctx.references.load_subject_rules() {
        Ok(rules) => rules,
        Err(e) => {
            error!("Cannot start ratings: {e}");
            return Reply::edit(messages::SUBJECTS_UNAVAILABLE, Some(keyboards::grade_choice()));
        }
    };

    record.grade = Some(grade.value());
    record.subject_order = rules.subjects_order;
    record.ratings.clear();
    record.current_subject_index = 0;
    record.stage = Stage::RatingSubjects;

    match record.current_subject() {
        Some(first) => Reply::edit(
            messages::rate_first_subject(first),
            Some(keyboards::rating_grid(first)),
        ),
        None => finish(record, ctx),
    }
}

/// Records the rating under the subject named by the button, which is not
/// checked against the subject currently expected.
fn rate_subject(
    record: &mut UserRecord,
    subject: &str,
    score: u8,
    ctx: &MachineContext<'_>,
) -> Reply {
    record.ratings.insert(subject.to_string(), score);
    record.current_subject_index = (record.current_subject_index + 1).min(record.subject_order.len());

    match record.current_subject() {
        Some(next) => Reply::edit(
            messages::rate_subject(next),
            Some(keyboards::rating_grid(next)),
        ),
        None => finish(record, ctx),
    }
}

fn finish(record: &mut UserRecord, ctx: &MachineContext<'_>) -> Reply {
    record.stage = Stage::Finished;

    let careers = match ctx.references.load_subject_rules() {
        Ok(rules) => recommend(&record.ratings, &rules.careers),
        Err(e) => {
            error!("Cannot compute recommendation: {e}");
            Vec::new()
        }
    };

    let kind = match record.grade.and_then(Grade::from_value) {
        Some(Grade::Ninth) => InstitutionKind::College,
        _ => InstitutionKind::University,
    };

    let institutions = careers
        .first()
        .map(|top| institutions_for(top, kind, ctx.references));

    Reply::edit(
        messages::format_result(&careers, kind, institutions.as_deref()),
        None,
    )
}

/// Institutions for `career`; a missing table reads as "none found".
fn institutions_for(
    career: &str,
    kind: InstitutionKind,
    references: &dyn ReferenceSource,
) -> Vec<Institution> {
    let table = match kind {
        InstitutionKind::College => references.load_colleges(),
        InstitutionKind::University => references.load_universities(),
    };

    match table {
        Ok(mut table) => table.remove(career).unwrap_or_default(),
        Err(e) => {
            warn!("Institution lookup for '{career}' failed: {e}");
            Vec::new()
        }
    }
}
