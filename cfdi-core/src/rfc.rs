//! RFC (Registro Federal de Contribuyentes) validation.
use regex::Regex;
use std::sync::LazyLock;

/// Placeholders for the general public and for foreign recipients.
pub const GENERIC_RFCS: [&str; 2] = ["XAXX010101000", "XEXX010101000"];

const CHECKSUM_ALPHABET: &str = "0123456789ABCDEFGHIJKLMN&OPQRSTUVWXYZ Ñ";

static RFC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-ZÑ&]{3,4}) ?(?:- ?)?(\d{2}(?:0[1-9]|1[0-2])(?:0[1-9]|[12]\d|3[01])) ?(?:- ?)?([A-Z\d]{2})([A\d])$",
    )
    .expect("RFC pattern is valid")
});

/// Check an RFC's shape and check digit.
///
/// Generic RFCs are accepted only when `accept_generic` is set.
///
/// # Examples
/// ```rust
/// use cfdi_core::rfc::is_valid_rfc;
///
/// assert!(is_valid_rfc("EKU9003173C9", false));
/// assert!(!is_valid_rfc("XAXX010101000", false));
/// assert!(is_valid_rfc("XAXX010101000", true));
/// ```
pub fn is_valid_rfc(id: &str, accept_generic: bool) -> bool {
    if GENERIC_RFCS.contains(&id) {
        return accept_generic;
    }
    if !RFC_PATTERN.is_match(id) {
        return false;
    }
    let mut chars: Vec<char> = id.chars().collect();
    let Some(check_digit) = chars.pop() else {
        return false;
    };
    expected_check_digit(&chars) == Some(check_digit)
}

fn expected_check_digit(body: &[char]) -> Option<char> {
    let weight_start = body.len() + 1;
    // personas morales have a 3 letter prefix
    let mut sum = if body.len() != 12 { 481 } else { 0 };
    for (i, c) in body.iter().enumerate() {
        let value = CHECKSUM_ALPHABET.chars().position(|a| a == *c)?;
        sum += value * (weight_start - i);
    }
    match 11 - sum % 11 {
        11 => Some('0'),
        10 => Some('A'),
        digit => char::from_digit(digit as u32, 10),
    }
}
