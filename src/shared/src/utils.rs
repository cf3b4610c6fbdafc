//! Small helpers with no better home.

use regex::Regex;

/// Return whether any of the regexes match.
pub fn any_match(s: &str, regexes: &[&Regex]) -> bool {
    regexes.iter().any(|r| r.is_match(s))
}

#[test]
fn match_any() {
    let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    let number = Regex::new(r"^[0-9]+$").unwrap();
    assert!(any_match("foo_bar", &[&ident, &number]));
    assert!(any_match("42", &[&ident, &number]));
    assert!(!any_match("4foo", &[&ident, &number]));
}
