use once_cell::sync::Lazy;
use regex::Regex;

/// National mobile number format: 11 ASCII digits behind a known carrier prefix
///
/// `[0-9]` instead of `\d`, as the latter also matches non-ASCII digits.
static MOBILE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:13[0-9]|14[57]|15[0-35-9]|18[07-9])[0-9]{8}$")
        .expect("mobile number pattern is valid")
});

/// Whether `phone` is a well-formed mobile number
///
/// The whole string must match: surrounding whitespace or separators are rejected.
pub fn is_valid_phone(phone: &str) -> bool {
    MOBILE_NUMBER.is_match(phone)
}
