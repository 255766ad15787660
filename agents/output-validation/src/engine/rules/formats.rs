//! String format checks
//!
//! Pure predicates shared by the structural compiler and the heuristic
//! semantic validator: RFC-lite email shape, strict `YYYY-MM-DD` dates, and
//! phone digit counts. Field-name conventions that opt a field into a check
//! without an explicit `format` also live here.

use chrono::NaiveDate;

/// Accepted digit count range for phone numbers
pub const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 7..=15;

const LOCAL_PART_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~-.";

/// Check the shape of an email address.
///
/// Returns the reason the address was rejected.
pub fn check_email(value: &str) -> Result<(), &'static str> {
    let mut parts = value.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err("An email address must have exactly one @-sign."),
    };

    if local.is_empty() {
        return Err("There must be something before the @-sign.");
    }
    if local.len() > 64
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(c))
    {
        return Err("The part before the @-sign is not valid.");
    }

    if domain.is_empty() {
        return Err("There must be something after the @-sign.");
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err("The part after the @-sign is not valid. It should have a period.");
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);
    if !labels_ok || !tld_ok {
        return Err("The domain name is not valid.");
    }

    Ok(())
}

pub fn is_valid_email(value: &str) -> bool {
    check_email(value).is_ok()
}

/// Parse a strict `YYYY-MM-DD` date, rejecting impossible calendar dates
pub fn parse_date(value: &str) -> Result<NaiveDate, &'static str> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return Err("Input should be a valid date in the format YYYY-MM-DD");
    }

    // Shape is ASCII digits, so the slices and parses cannot fail
    let year: i32 = value[0..4].parse().map_err(|_| "invalid year")?;
    let month: u32 = value[5..7].parse().map_err(|_| "invalid month")?;
    let day: u32 = value[8..10].parse().map_err(|_| "invalid day")?;

    if !(1..=12).contains(&month) {
        return Err("Input should be a valid date, month value is outside expected range of 1-12");
    }
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or("Input should be a valid date, day value is outside expected range")
}

pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_ok()
}

/// Number of ASCII digits in a phone-like string
pub fn phone_digit_count(value: &str) -> usize {
    value.chars().filter(|c| c.is_ascii_digit()).count()
}

pub fn is_plausible_phone(value: &str) -> bool {
    PHONE_DIGITS.contains(&phone_digit_count(value))
}

/// Field names that conventionally hold email addresses
pub fn is_email_field(name: &str) -> bool {
    name.to_ascii_lowercase().contains("email")
}

/// Field names that conventionally hold calendar dates
pub fn is_date_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "date" || lower.ends_with("_date") || lower.starts_with("date_")
}

/// Field names that conventionally hold phone numbers
pub fn is_phone_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("phone") || lower.contains("mobile") || lower == "tel" || lower.ends_with("_tel")
}
