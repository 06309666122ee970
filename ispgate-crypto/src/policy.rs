//! Password composition rules.
//!
//! Rules are checked in a fixed order and the first failure is reported, so
//! a given bad password always produces the same message.

use serde::Serialize;
use thiserror::Error;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum password length in characters.
pub const MAX_PASSWORD_LEN: usize = 128;

/// The first composition rule a password failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyViolation {
    #[error("password must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("password must not exceed {max} characters")]
    TooLong { max: usize },

    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("password must contain at least one number")]
    MissingDigit,

    #[error("password must contain at least one special character")]
    MissingSymbol,
}

/// Length bounds for passwords; the character-class rules are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_len: MIN_PASSWORD_LEN,
            max_len: MAX_PASSWORD_LEN,
        }
    }
}

impl PasswordPolicy {
    /// Validates `plaintext`, returning the first violated rule.
    ///
    /// Order: too short, too long, uppercase, lowercase, digit, symbol.
    pub fn validate(&self, plaintext: &str) -> Result<(), PolicyViolation> {
        let len = plaintext.chars().count();
        if len < self.min_len {
            return Err(PolicyViolation::TooShort { min: self.min_len });
        }
        if len > self.max_len {
            return Err(PolicyViolation::TooLong { max: self.max_len });
        }

        let mut has_upper = false;
        let mut has_lower = false;
        let mut has_digit = false;
        let mut has_symbol = false;

        for c in plaintext.chars() {
            if c.is_uppercase() {
                has_upper = true;
            } else if c.is_lowercase() {
                has_lower = true;
            } else if c.is_numeric() {
                has_digit = true;
            } else if is_symbol(c) {
                has_symbol = true;
            }
        }

        if !has_upper {
            return Err(PolicyViolation::MissingUppercase);
        }
        if !has_lower {
            return Err(PolicyViolation::MissingLowercase);
        }
        if !has_digit {
            return Err(PolicyViolation::MissingDigit);
        }
        if !has_symbol {
            return Err(PolicyViolation::MissingSymbol);
        }
        Ok(())
    }
}

/// Punctuation or symbol. Outside ASCII this is any visible character that
/// is not a letter or digit, excluding combining marks, invisible format
/// characters and private-use code points.
fn is_symbol(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }
    !c.is_alphanumeric()
        && !c.is_whitespace()
        && !c.is_control()
        && !is_mark_or_format(c)
}

fn is_mark_or_format(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0300}'..='\u{036F}'
            | '\u{0483}'..='\u{0489}'
            | '\u{0591}'..='\u{05BD}'
            | '\u{0610}'..='\u{061A}'
            | '\u{064B}'..='\u{065F}'
            | '\u{0900}'..='\u{0903}'
            | '\u{093A}'..='\u{094F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{180B}'..='\u{180F}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{206F}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{E000}'..='\u{F8FF}'
            | '\u{FE00}'..='\u{FE0F}'
            | '\u{FE20}'..='\u{FE2F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{E0000}'..='\u{E0FFF}'
            | '\u{F0000}'..='\u{10FFFF}'
    )
}
