use super::*;
use yare::parameterized;

#[parameterized(
    plain = { "dev-frontend", "dev-frontend" },
    spaces = { "dev frontend", "dev-frontend" },
    punctuation = { "dev@front/end", "dev-front-end" },
    collapsed_dashes = { "a--b", "a-b" },
    edge_dashes = { "-abc-", "abc" },
    empty = { "", "unknown" },
    all_junk = { "///", "unknown" },
)]
fn slugify_cases(raw: &str, expected: &str) {
    assert_eq!(slugify(raw), expected);
}

#[test]
fn digest_is_stable_sha1_hex() {
    let d = text_digest("hello\n");
    assert_eq!(d.len(), 40);
    assert!(d.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(d, text_digest("hello\n"));
}

#[test]
fn digest_normalizes_line_endings() {
    assert_eq!(text_digest("a\r\nb\r\n"), text_digest("a\nb\n"));
    assert_eq!(text_digest("a\rb"), text_digest("a\nb"));
}

#[test]
fn digest_differs_on_content_change() {
    assert_ne!(text_digest("a"), text_digest("b"));
}
