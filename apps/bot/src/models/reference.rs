use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Weight table of one career, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct CareerRule {
    pub career: String,
    pub weights: Vec<(String, i64)>,
}

/// Parsed subject rules document.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRules {
    /// Subjects to prompt for, in order.
    pub subjects_order: Vec<String>,
    /// Careers in document order; this order breaks score ties.
    pub careers: Vec<CareerRule>,
}

/// Career → institutions, as stored in the university and college tables.
pub type InstitutionTable = BTreeMap<String, Vec<Institution>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Institution {
    pub name: String,
    #[serde(default)]
    pub price: Option<AttrValue>,
    #[serde(default)]
    pub grant: Option<AttrValue>,
    #[serde(default)]
    pub grant_score: Option<AttrValue>,
}

/// Institution attributes are hand-edited and come as numbers, strings or flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(true) => f.write_str("иә"),
            AttrValue::Bool(false) => f.write_str("жоқ"),
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::Float(n) => write!(f, "{n}"),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}
