//! Email recipient list parsing and validation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

/// Basic `local@domain.tld` shape check. Full RFC 5322 parsing happens later
/// when the SMTP message is built.
fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Whether `address` looks like `local@domain.tld`.
pub fn is_valid_email(address: &str) -> bool {
    email_pattern().is_match(address)
}

/// Split a recipient string on `,` or `;`, trimming whitespace and dropping
/// empty segments.
pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalise and validate a recipient list.
///
/// Each entry may itself be a delimited list. Fails when the result is
/// empty or when any address is malformed; the error lists every offender.
pub fn parse_recipients<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, CoreError> {
    let recipients: Vec<String> = raw
        .iter()
        .flat_map(|entry| split_recipients(entry.as_ref()))
        .collect();

    if recipients.is_empty() {
        return Err(CoreError::Validation(
            "At least one recipient email is required".to_string(),
        ));
    }

    let invalid: Vec<&str> = recipients
        .iter()
        .filter(|r| !is_valid_email(r))
        .map(String::as_str)
        .collect();

    if !invalid.is_empty() {
        return Err(CoreError::Validation(format!(
            "Invalid recipient email(s): {}",
            invalid.join(", ")
        )));
    }

    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_commas_and_semicolons() {
        let parsed = parse_recipients(&["a@x.com, b@y.com; c@z.com"]).unwrap();
        assert_eq!(parsed, vec!["a@x.com", "b@y.com", "c@z.com"]);
    }

    #[test]
    fn drops_empty_segments() {
        assert_eq!(split_recipients(" a@x.com ;; ,b@y.com, "), vec!["a@x.com", "b@y.com"]);
    }

    #[test]
    fn accepts_pre_split_lists() {
        let parsed = parse_recipients(&["a@x.com", "b@y.com;c@z.com"]).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn rejects_malformed_address() {
        let err = parse_recipients(&["not-an-email"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Invalid recipient email(s): not-an-email"
        );
    }

    #[test]
    fn lists_every_invalid_address() {
        let err = parse_recipients(&["ok@x.com, bad, also@bad"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad, also@bad"), "{msg}");
        assert!(!msg.contains("ok@x.com"));
    }

    #[test]
    fn rejects_empty_list() {
        assert!(parse_recipients(&[" ; , "]).is_err());
        assert!(parse_recipients::<&str>(&[]).is_err());
    }
}
