use crate::errors::BotError;

/// Shortest digit count accepted as a phone number.
pub const MIN_PHONE_DIGITS: usize = 9;

const RESTART_COMMANDS: &[&str] = &["/start", "бастау", "restart", "қайта"];

/// Zero code points of the decimal digit blocks folded to ASCII.
const DIGIT_ZEROS: &[u32] = &[
    0x0030, // ASCII
    0x0660, // Arabic-Indic
    0x06F0, // Extended Arabic-Indic
    0x0966, // Devanagari
    0x09E6, // Bengali
    0x0E50, // Thai
    0xFF10, // Fullwidth
];

/// ASCII form of a decimal digit from any of the `DIGIT_ZEROS` blocks.
fn ascii_digit(c: char) -> Option<char> {
    let code = u32::from(c);
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .and_then(|&zero| char::from_digit(code - zero, 10))
}

/// Strips everything but digits and checks the length.
/// Full-width and other decimal digits are stored as ASCII.
///
/// `"8 (702) 111-22-33"` → `"87021112233"`.
pub fn normalize_phone(text: &str) -> Result<String, BotError> {
    let digits: String = text.chars().filter_map(ascii_digit).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(BotError::ValidationFailure(format!(
            "phone has {} digits, need at least {MIN_PHONE_DIGITS}",
            digits.len()
        )));
    }
    Ok(digits)
}

/// True for `/start` and its synonyms, ignoring case and surrounding space.
pub fn is_restart_command(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    RESTART_COMMANDS.contains(&text.as_str())
}
