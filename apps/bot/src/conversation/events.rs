use crate::errors::BotError;

pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 10;

/// Inbound event from the messaging gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Text(String),
    Button(Callback),
}

/// Decoded button payload.
///
/// Wire form: `check_paid`, `grade|<9|11>`, `rate|<subject>|<0..=10>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    CheckPaid,
    Grade(Grade),
    Rate { subject: String, score: u8 },
}

/// School year bucket. Grade 9 is shown colleges, grade 11 universities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Ninth,
    Eleventh,
}

impl Grade {
    pub fn value(self) -> u8 {
        match self {
            Grade::Ninth => 9,
            Grade::Eleventh => 11,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            9 => Some(Grade::Ninth),
            11 => Some(Grade::Eleventh),
            _ => None,
        }
    }
}

impl Callback {
    pub fn parse(payload: &str) -> Result<Self, BotError> {
        let malformed = || BotError::MalformedEvent(format!("unrecognized payload '{payload}'"));

        if payload == "check_paid" {
            return Ok(Callback::CheckPaid);
        }

        if let Some(value) = payload.strip_prefix("grade|") {
            let grade = value
                .parse::<u8>()
                .ok()
                .and_then(Grade::from_value)
                .ok_or_else(malformed)?;
            return Ok(Callback::Grade(grade));
        }

        if let Some(rest) = payload.strip_prefix("rate|") {
            // Score is split off the right so subject names may contain '|'.
            let (subject, score) = rest.rsplit_once('|').ok_or_else(malformed)?;
            if subject.is_empty() {
                return Err(malformed());
            }
            let score = score
                .parse::<u8>()
                .ok()
                .filter(|s| (MIN_SCORE..=MAX_SCORE).contains(s))
                .ok_or_else(malformed)?;
            return Ok(Callback::Rate {
                subject: subject.to_string(),
                score,
            });
        }

        Err(malformed())
    }

    pub fn encode(&self) -> String {
        match self {
            Callback::CheckPaid => "check_paid".to_string(),
            Callback::Grade(grade) => format!("grade|{}", grade.value()),
            Callback::Rate { subject, score } => format!("rate|{subject}|{score}"),
        }
    }
}
