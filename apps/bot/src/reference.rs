//! Static lookup tables: career weight rules, universities and colleges.
//!
//! Nothing is cached. Every call re-reads the backing file so edits take
//! effect on the next conversation step.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::BotError;
use crate::models::reference::{CareerRule, InstitutionTable, SubjectRules};

const SUBJECTS_ORDER_KEY: &str = "subjects_order";

pub trait ReferenceSource: Send + Sync {
    fn load_subject_rules(&self) -> Result<SubjectRules, BotError>;
    fn load_universities(&self) -> Result<InstitutionTable, BotError>;
    fn load_colleges(&self) -> Result<InstitutionTable, BotError>;
}

/// Reference tables backed by three JSON files.
#[derive(Debug, Clone)]
pub struct ReferenceFiles {
    pub subject_rules: PathBuf,
    pub universities: PathBuf,
    pub colleges: PathBuf,
}

impl ReferenceFiles {
    fn read(path: &Path) -> Result<String, BotError> {
        debug!("Reading reference table {}", path.display());
        fs::read_to_string(path)
            .map_err(|e| BotError::ReferenceDataMissing(format!("{}: {e}", path.display())))
    }

    fn load_institutions(path: &Path) -> Result<InstitutionTable, BotError> {
        let raw = Self::read(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| BotError::ReferenceDataMissing(format!("{}: {e}", path.display())))
    }
}

impl ReferenceSource for ReferenceFiles {
    fn load_subject_rules(&self) -> Result<SubjectRules, BotError> {
        let raw = Self::read(&self.subject_rules)?;
        parse_subject_rules(&raw)
    }

    fn load_universities(&self) -> Result<InstitutionTable, BotError> {
        Self::load_institutions(&self.universities)
    }

    fn load_colleges(&self) -> Result<InstitutionTable, BotError> {
        Self::load_institutions(&self.colleges)
    }
}

/// Parses the subject rules document.
///
/// Shape: `{"subjects_order": [..], "<career>": {"weights": {"<subject>": n}}, ..}`.
/// Career order follows the document.
pub fn parse_subject_rules(raw: &str) -> Result<SubjectRules, BotError> {
    let missing = |msg: String| BotError::ReferenceDataMissing(format!("subject rules: {msg}"));

    let doc: Value = serde_json::from_str(raw).map_err(|e| missing(e.to_string()))?;
    let doc = doc
        .as_object()
        .ok_or_else(|| missing("top level is not an object".to_string()))?;

    let subjects_order: Vec<String> = doc
        .get(SUBJECTS_ORDER_KEY)
        .ok_or_else(|| missing(format!("'{SUBJECTS_ORDER_KEY}' is missing")))
        .and_then(|v| {
            serde_json::from_value(v.clone())
                .map_err(|e| missing(format!("'{SUBJECTS_ORDER_KEY}': {e}")))
        })?;
    if subjects_order.is_empty() {
        return Err(missing(format!("'{SUBJECTS_ORDER_KEY}' is empty")));
    }

    let mut careers = Vec::new();
    for (career, rule) in doc.iter().filter(|(k, _)| k.as_str() != SUBJECTS_ORDER_KEY) {
        let weights = rule
            .get("weights")
            .and_then(Value::as_object)
            .ok_or_else(|| missing(format!("career '{career}' has no weights")))?;

        let mut parsed = Vec::with_capacity(weights.len());
        for (subject, weight) in weights {
            let weight = weight.as_i64().ok_or_else(|| {
                missing(format!("career '{career}': weight for '{subject}' is not an integer"))
            })?;
            parsed.push((subject.clone(), weight));
        }

        careers.push(CareerRule {
            career: career.clone(),
            weights: parsed,
        });
    }

    Ok(SubjectRules {
        subjects_order,
        careers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reference::AttrValue;

    const RULES: &str = r#"{
        "Программист": {"weights": {"Математика": 3, "Информатика": 3}},
        "Дәрігер": {"weights": {"Биология": 3, "Химия": 2}},
        "subjects_order": ["Математика", "Информатика", "Биология", "Химия"],
        "Дизайнер": {"weights": {"Сурет": 3}}
    }"#;

    fn files_in(dir: &Path) -> ReferenceFiles {
        ReferenceFiles {
            subject_rules: dir.join("subject_rules.json"),
            universities: dir.join("universities.json"),
            colleges: dir.join("colleges.json"),
        }
    }

    #[test]
    fn test_parse_keeps_document_order() {
        let rules = parse_subject_rules(RULES).unwrap();
        let names: Vec<_> = rules.careers.iter().map(|c| c.career.as_str()).collect();
        assert_eq!(names, vec!["Программист", "Дәрігер", "Дизайнер"]);
        assert_eq!(rules.subjects_order.len(), 4);
        assert_eq!(
            rules.careers[1].weights,
            vec![("Биология".to_string(), 3), ("Химия".to_string(), 2)]
        );
    }

    #[test]
    fn test_missing_subjects_order_is_rejected() {
        let err = parse_subject_rules(r#"{"X": {"weights": {"Math": 1}}}"#).unwrap_err();
        assert!(matches!(err, BotError::ReferenceDataMissing(_)));
    }

    #[test]
    fn test_empty_subjects_order_is_rejected() {
        let err = parse_subject_rules(r#"{"subjects_order": []}"#).unwrap_err();
        assert!(matches!(err, BotError::ReferenceDataMissing(_)));
    }

    #[test]
    fn test_career_without_weights_is_rejected() {
        let err =
            parse_subject_rules(r#"{"subjects_order": ["Math"], "X": {"w": {}}}"#).unwrap_err();
        assert!(matches!(err, BotError::ReferenceDataMissing(_)));
    }

    #[test]
    fn test_non_integer_weight_is_rejected() {
        let err = parse_subject_rules(
            r#"{"subjects_order": ["Math"], "X": {"weights": {"Math": "high"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BotError::ReferenceDataMissing(_)));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = parse_subject_rules("not json").unwrap_err();
        assert!(matches!(err, BotError::ReferenceDataMissing(_)));
    }

    #[test]
    fn test_missing_files_are_reference_data_missing() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());
        assert!(matches!(
            files.load_subject_rules(),
            Err(BotError::ReferenceDataMissing(_))
        ));
        assert!(matches!(
            files.load_universities(),
            Err(BotError::ReferenceDataMissing(_))
        ));
        assert!(matches!(
            files.load_colleges(),
            Err(BotError::ReferenceDataMissing(_))
        ));
    }

    #[test]
    fn test_files_are_reread_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());

        fs::write(&files.colleges, r#"{"Дизайнер": [{"name": "A", "price": 1}]}"#).unwrap();
        assert_eq!(files.load_colleges().unwrap()["Дизайнер"].len(), 1);

        fs::write(
            &files.colleges,
            r#"{"Дизайнер": [{"name": "A"}, {"name": "B", "grant": false}]}"#,
        )
        .unwrap();
        let colleges = files.load_colleges().unwrap();
        assert_eq!(colleges["Дизайнер"].len(), 2);
        assert_eq!(colleges["Дизайнер"][1].grant, Some(AttrValue::Bool(false)));
    }

    #[test]
    fn test_institution_without_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());
        fs::write(&files.universities, r#"{"X": [{"price": 1}]}"#).unwrap();
        assert!(matches!(
            files.load_universities(),
            Err(BotError::ReferenceDataMissing(_))
        ));
    }
}
