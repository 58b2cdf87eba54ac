// User-facing text of the conversation.
// Every message the bot sends is defined or assembled here.

use crate::models::reference::{AttrValue, Institution};

/// Institutions listed per result.
const MAX_INSTITUTIONS: usize = 3;

pub const WELCOME: &str = "\
Сәлем! Бұл бот сенің сүйікті пәндерің бойынша мамандық пен оқу орындарын ұсынады.\n\n\
Бірінші қадам — телефон нөміріңді жазыңыз (мыс: 87021234567). Бұл төлемді сәйкестендіру үшін қажет.";

pub const PHONE_REPROMPT: &str =
    "Телефон нөмірін толық және цифрмен жазыңыз (мыс: 87021234567).";

pub const BUTTONS_ONLY: &str =
    "Мен тек батырмалар арқылы жүруге ұсынамын. Телефоныңды бастаудан кейін батырмалар шығады.";

pub const PAYMENT_CONFIRMED: &str = "✅ Төлем расталды! Қайсы сыныпсың?";

pub const PAYMENT_PENDING: &str = "\
❗ Төлем әлі расталған жоқ. Kaspi арқылы төлеңіз және бірнеше секунд ішінде жүйе автоматты түрде растайды. \
Немесе «Төледім / Тексеру» батырмасын қайтадан басыңыз.";

pub const PAYMENT_RECEIVED: &str =
    "✅ Төлеміңіз қабылданды! Жалғастыру үшін «Мен төледім / Тексеру» батырмасын басыңыз.";

pub const RATING_INTRO: &str = "Әр пәнге 0-ден 10-ға дейін баға беріңіз.";

pub const UNSUPPORTED_BUTTON: &str = "Басқа батырмаға қатысты операция әлі қосылмаған.";

pub const STALE_BUTTON: &str =
    "Бұл батырма ескірген. 🔄 Қайта бастау үшін /start жіберіңіз.";

pub const SUBJECTS_UNAVAILABLE: &str =
    "Пәндер тізімі табылмады. Кейінірек қайталап көріңіз немесе /start жіберіңіз.";

pub const TEMPORARY_FAILURE: &str = "Қате орын алды. Кейінірек қайталап көріңіз.";

const RESULT_HEADER: &str = "✅ Сенің ұнататын пәндерің бойынша ұсынылатын мамандықтар:";
const CAREERS_NOT_FOUND: &str = "Мамандықтар табылмады.";
const COLLEGES_HEADER: &str = "Ұсынылатын колледждер:";
const COLLEGES_NOT_FOUND: &str = "Колледждер табылмады.";
const UNIVERSITIES_HEADER: &str = "Ұсынылатын университеттер:";
const UNIVERSITIES_NOT_FOUND: &str = "Университеттер табылмады.";
const RESTART_HINT: &str = "🔄 Қайта бастау үшін /start жіберіңіз.";

/// Which institution table backs the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstitutionKind {
    College,
    University,
}

pub fn payment_instructions(payment_details: &str, phone: &str) -> String {
    format!(
        "Төлем жасау нұсқаулық:\n\n\
         💳 {payment_details}\n\
         📝 Комментарийге мынаны міндетті түрде жазыңыз:\n➡ {phone}\n\n\
         Kaspi-ден төлем түскен соң жүйе автоматты түрде сізді келесі қадамға өткізеді.\n\
         Егер төлем автоматты түрде расталмаса, «Мен төледім / Тексеру» батырмасын басыңыз."
    )
}

pub fn rate_first_subject(subject: &str) -> String {
    format!("{RATING_INTRO}\n\n{}", rate_subject(subject))
}

pub fn rate_subject(subject: &str) -> String {
    format!("{subject} үшін баға таңдаңыз:")
}

fn attr(value: Option<&AttrValue>) -> String {
    value.map_or_else(|| "—".to_string(), ToString::to_string)
}

fn institution_line(kind: InstitutionKind, inst: &Institution) -> String {
    match kind {
        InstitutionKind::College => format!(
            "• {} — Ақша: {} тг — Грант бар ма: {}",
            inst.name,
            attr(inst.price.as_ref()),
            attr(inst.grant.as_ref())
        ),
        InstitutionKind::University => format!(
            "• {} — Грант: {} балл — Платный: {} тг",
            inst.name,
            attr(inst.grant_score.as_ref()),
            attr(inst.price.as_ref())
        ),
    }
}

/// Final message: ranked careers, then institutions for the top career.
///
/// `institutions` is `None` when no career was recommended; an empty slice
/// prints the "not found" line for that table.
pub fn format_result(
    careers: &[String],
    kind: InstitutionKind,
    institutions: Option<&[Institution]>,
) -> String {
    let mut msg = format!("{RESULT_HEADER}\n\n");

    if careers.is_empty() {
        msg.push_str(CAREERS_NOT_FOUND);
        msg.push('\n');
    }
    for (i, career) in careers.iter().enumerate() {
        msg.push_str(&format!("{}. {career}\n", i + 1));
    }

    if let Some(institutions) = institutions {
        let (header, not_found) = match kind {
            InstitutionKind::College => (COLLEGES_HEADER, COLLEGES_NOT_FOUND),
            InstitutionKind::University => (UNIVERSITIES_HEADER, UNIVERSITIES_NOT_FOUND),
        };
        msg.push('\n');
        if institutions.is_empty() {
            msg.push_str(not_found);
            msg.push('\n');
        } else {
            msg.push_str(header);
            msg.push('\n');
            for inst in institutions.iter().take(MAX_INSTITUTIONS) {
                msg.push_str(&institution_line(kind, inst));
                msg.push('\n');
            }
        }
    }

    msg.push('\n');
    msg.push_str(RESTART_HINT);
    msg
}
