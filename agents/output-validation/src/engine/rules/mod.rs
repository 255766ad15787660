//! Pure field checks shared by the structural compiler and the heuristic
//! semantic validator
//!
//! Nothing here knows about schemas or results; every check takes a field
//! name and/or a string value and answers yes or no with a reason.

pub mod formats;
pub mod names;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use formats::{check_email, is_plausible_phone, is_valid_date, is_valid_email, parse_date};
pub use names::{is_name_field, validate_name_content, NameRejection};

/// Semantic string formats with a dedicated check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Email,
    Date,
    Phone,
}

impl StringFormat {
    /// Map a schema `format` tag; unknown tags carry no check
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "email" => Some(StringFormat::Email),
            "date" => Some(StringFormat::Date),
            "phone" | "tel" => Some(StringFormat::Phone),
            _ => None,
        }
    }

    /// Formats applying to a field by explicit tag or by naming convention,
    /// in evaluation order
    pub fn for_field(name: &str, tag: Option<&str>) -> Vec<StringFormat> {
        let explicit = tag.and_then(StringFormat::from_tag);
        [
            (StringFormat::Email, formats::is_email_field(name)),
            (StringFormat::Date, formats::is_date_field(name)),
            (StringFormat::Phone, formats::is_phone_field(name)),
        ]
        .into_iter()
        .filter(|(format, by_name)| explicit == Some(*format) || *by_name)
        .map(|(format, _)| format)
        .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Date => "date",
            StringFormat::Phone => "phone",
        }
    }

    /// Check a value, returning the rejection message
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            StringFormat::Email => check_email(value)
                .map_err(|reason| format!("value is not a valid email address: {}", reason)),
            StringFormat::Date => parse_date(value).map(|_| ()).map_err(str::to_string),
            StringFormat::Phone => {
                if is_plausible_phone(value) {
                    Ok(())
                } else {
                    Err(format!(
                        "Phone number should have between {} and {} digits",
                        formats::PHONE_DIGITS.start(),
                        formats::PHONE_DIGITS.end()
                    ))
                }
            }
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_for_field() {
        assert_eq!(StringFormat::for_field("email", None), vec![StringFormat::Email]);
        assert_eq!(
            StringFormat::for_field("contact", Some("email")),
            vec![StringFormat::Email]
        );
        assert_eq!(StringFormat::for_field("start_date", None), vec![StringFormat::Date]);
        assert_eq!(StringFormat::for_field("phone", None), vec![StringFormat::Phone]);
        assert!(StringFormat::for_field("title", Some("uri")).is_empty());
    }

    #[test]
    fn test_check_messages() {
        let err = StringFormat::Email.check("not-an-email").unwrap_err();
        assert!(err.starts_with("value is not a valid email address"));
        assert!(StringFormat::Date.check("2023-01-45").is_err());
        assert!(StringFormat::Phone.check("555-1234").is_ok());
    }
}
