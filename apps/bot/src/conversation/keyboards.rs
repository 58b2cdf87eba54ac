use crate::conversation::events::{Callback, Grade, MAX_SCORE, MIN_SCORE};

/// Rating buttons per keyboard row.
pub const RATING_ROW_WIDTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: Callback,
}

impl Button {
    fn new(label: impl Into<String>, callback: Callback) -> Self {
        Self {
            label: label.into(),
            callback,
        }
    }
}

/// Controls attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controls {
    /// Reply keyboard with one hint button; pressing it sends its label as text.
    Prompt(String),
    /// Inline buttons, row by row.
    Inline(Vec<Vec<Button>>),
}

impl Controls {
    pub fn is_inline(&self) -> bool {
        matches!(self, Controls::Inline(_))
    }
}

pub fn phone_prompt() -> Controls {
    Controls::Prompt("Жіберу телефоның (мыс: 8702...)".to_string())
}

pub fn check_payment() -> Controls {
    Controls::Inline(vec![vec![Button::new(
        "Мен төледім / Тексеру",
        Callback::CheckPaid,
    )]])
}

pub fn grade_choice() -> Controls {
    Controls::Inline(vec![vec![
        Button::new("9 сынып", Callback::Grade(Grade::Ninth)),
        Button::new("11 сынып", Callback::Grade(Grade::Eleventh)),
    ]])
}

/// Scores 0..=10 for `subject`, wrapped at six buttons per row.
pub fn rating_grid(subject: &str) -> Controls {
    let buttons: Vec<Button> = (MIN_SCORE..=MAX_SCORE)
        .map(|score| {
            Button::new(
                score.to_string(),
                Callback::Rate {
                    subject: subject.to_string(),
                    score,
                },
            )
        })
        .collect();

    Controls::Inline(
        buttons
            .chunks(RATING_ROW_WIDTH)
            .map(<[Button]>::to_vec)
            .collect(),
    )
}
