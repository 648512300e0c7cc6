//! Form input hygiene applied before values reach hashing, signing or storage.
//!
//! Shape checks only: `sanitize_email` looks at form, not
//! deliverability, and `sanitize_kenyan_phone` normalizes national formats
//! into `+254…` without consulting a numbering plan.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ForgeguardError, ForgeguardResult};

/// Maximum length of a sanitized string, in UTF-16 code units.
pub const MAX_STRING_UNITS: usize = 1000;

const STRIPPED_CHARS: &[char] = &['<', '>', '"', '\'', '%', ';', '(', ')', '&', '+'];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Strip markup-prone characters, trim, and cap the length.
pub fn sanitize_string(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();

    let mut units = 0;
    stripped
        .trim()
        .chars()
        .take_while(|c| {
            units += c.len_utf16();
            units <= MAX_STRING_UNITS
        })
        .collect()
}

/// Lowercase and trim an email address, rejecting anything not shaped like
/// `local@domain.tld`.
pub fn sanitize_email(input: &str) -> ForgeguardResult<String> {
    let email = input.trim().to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        tracing::debug!("rejected email input");
        Err(ForgeguardError::InvalidEmail)
    }
}

/// Normalize a Kenyan phone number to `+254XXXXXXXXX`.
///
/// Accepts `07…` (trunk prefix), `2547…` (country code without `+`) and bare
/// 9-digit subscriber numbers. `"0712345678"`, `"254712345678"` and
/// `"712345678"` all become `"+254712345678"`. Meant to be applied once to raw
/// input; its own output happens to pass through the `254` branch unchanged.
pub fn sanitize_kenyan_phone(input: &str) -> ForgeguardResult<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();

    if let Some(rest) = digits.strip_prefix('0') {
        Ok(format!("+254{rest}"))
    } else if digits.starts_with("254") {
        Ok(format!("+{digits}"))
    } else if digits.len() == 9 {
        Ok(format!("+254{digits}"))
    } else {
        tracing::debug!(digits = digits.len(), "rejected phone input");
        Err(ForgeguardError::InvalidPhoneFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_string_strips_blacklist() {
        assert_eq!(
            sanitize_string("  <script>alert('x');</script>  "),
            "scriptalertx/script"
        );
        assert_eq!(sanitize_string("Tom & Jerry + 100%"), "Tom  Jerry  100");
    }

    #[test]
    fn test_sanitize_string_trims_after_stripping() {
        assert_eq!(sanitize_string("<  hello  >"), "hello");
    }

    #[test]
    fn test_sanitize_string_truncates() {
        let long = "a".repeat(1500);
        assert_eq!(sanitize_string(&long).len(), MAX_STRING_UNITS);
    }

    #[test]
    fn test_sanitize_string_truncation_respects_surrogate_pairs() {
        // Each emoji is two UTF-16 units; 999 + 2 would exceed the cap
        let input = format!("{}{}", "a".repeat(999), "😀😀");
        let out = sanitize_string(&input);
        assert_eq!(out, "a".repeat(999));
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email("  Foo@BAR.com ").unwrap(), "foo@bar.com");
        assert_eq!(
            sanitize_email("eng.team@firm.co.ke").unwrap(),
            "eng.team@firm.co.ke"
        );
    }

    #[test]
    fn test_sanitize_email_rejects() {
        for bad in ["not-an-email", "a@b", "@bar.com", "foo@", "a b@c.com", ""] {
            let err = sanitize_email(bad).unwrap_err();
            assert!(matches!(err, ForgeguardError::InvalidEmail), "{bad:?}");
        }
    }

    #[test]
    fn test_kenyan_phone_formats_converge() {
        for input in ["0712345678", "254712345678", "712345678", "+254 712 345 678"] {
            assert_eq!(
                sanitize_kenyan_phone(input).unwrap(),
                "+254712345678",
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_kenyan_phone_strips_punctuation() {
        assert_eq!(
            sanitize_kenyan_phone("(0712) 345-678").unwrap(),
            "+254712345678"
        );
    }

    #[test]
    fn test_kenyan_phone_rejects() {
        for bad in ["", "12345", "1234567890", "abc"] {
            let err = sanitize_kenyan_phone(bad).unwrap_err();
            assert!(matches!(err, ForgeguardError::InvalidPhoneFormat), "{bad:?}");
        }
    }

    #[test]
    fn test_kenyan_phone_reapplied_output() {
        let once = sanitize_kenyan_phone("0712345678").unwrap();
        assert_eq!(sanitize_kenyan_phone(&once).unwrap(), once);
    }

    proptest! {
        #[test]
        fn sanitized_string_never_contains_blacklist(s in ".{0,1200}") {
            let out = sanitize_string(&s);
            prop_assert!(!out.chars().any(|c| STRIPPED_CHARS.contains(&c)));
            prop_assert!(out.encode_utf16().count() <= MAX_STRING_UNITS);
        }
    }
}
