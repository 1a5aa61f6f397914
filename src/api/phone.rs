//! # Phone Normalization

use crate::consts::{COUNTRY_CODE_DIGIT, DOMESTIC_TRUNK_PREFIX};

/// Reduces a phone number to bare digits and rewrites the domestic trunk
/// prefix `8` to the country code `7`.
///
/// Both the gateway and the crm store numbers in this shape, so every phone
/// that enters the system passes through here first.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    match digits.strip_prefix(DOMESTIC_TRUNK_PREFIX) {
        Some(rest) => format!("{COUNTRY_CODE_DIGIT}{rest}"),
        None => digits,
    }
}
