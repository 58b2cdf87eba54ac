// Shared test fixtures for the conversation core.

use crate::errors::BotError;
use crate::models::reference::{CareerRule, Institution, InstitutionTable, SubjectRules};
use crate::reference::ReferenceSource;

/// In-memory reference tables. `None` tables behave like missing files.
#[derive(Default)]
pub struct StaticReferences {
    pub rules: Option<SubjectRules>,
    pub universities: Option<InstitutionTable>,
    pub colleges: Option<InstitutionTable>,
}

impl ReferenceSource for StaticReferences {
    fn load_subject_rules(&self) -> Result<SubjectRules, BotError> {
        self.rules
            .clone()
            .ok_or_else(|| BotError::ReferenceDataMissing("subject rules".to_string()))
    }

    fn load_universities(&self) -> Result<InstitutionTable, BotError> {
        self.universities
            .clone()
            .ok_or_else(|| BotError::ReferenceDataMissing("universities".to_string()))
    }

    fn load_colleges(&self) -> Result<InstitutionTable, BotError> {
        self.colleges
            .clone()
            .ok_or_else(|| BotError::ReferenceDataMissing("colleges".to_string()))
    }
}

/// CareerX = 2·Math + Physics, CareerY = 3·Art; subjects Math, Physics, Art.
pub fn sample_rules() -> SubjectRules {
    SubjectRules {
        subjects_order: vec!["Math".into(), "Physics".into(), "Art".into()],
        careers: vec![
            CareerRule {
                career: "CareerX".into(),
                weights: vec![("Math".into(), 2), ("Physics".into(), 1)],
            },
            CareerRule {
                career: "CareerY".into(),
                weights: vec![("Art".into(), 3)],
            },
        ],
    }
}

pub fn institution(name: &str) -> Institution {
    Institution {
        name: name.to_string(),
        price: None,
        grant: None,
        grant_score: None,
    }
}

/// Sample rules, a university for CareerX and no colleges at all.
pub fn sample_references() -> StaticReferences {
    let mut universities = InstitutionTable::new();
    universities.insert("CareerX".into(), vec![institution("Tech University")]);

    StaticReferences {
        rules: Some(sample_rules()),
        universities: Some(universities),
        colleges: Some(InstitutionTable::new()),
    }
}
