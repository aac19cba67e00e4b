/// Cleans a headline candidate for display.
///
/// Feed titles and page headings are attacker-controlled text that ends up
/// on a terminal, so control characters (including ANSI escape introducers)
/// are dropped. Whitespace runs collapse to a single space: headings with
/// nested markup otherwise pick up stray newlines and indentation when
/// their text nodes are joined.
///
/// # Examples
///
/// ```
/// use masthead::util::tidy_text;
///
/// assert_eq!(tidy_text("  Breaking:\n\t major   story  "), "Breaking: major story");
/// assert_eq!(tidy_text("Strip\x00 the\x07 bells"), "Strip the bells");
/// ```
pub fn tidy_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if ch.is_control() {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

/// Case-insensitive substring test using full Unicode lowercasing, so
/// Cyrillic and other non-Latin titles match the same way Latin ones do.
///
/// # Examples
///
/// ```
/// use masthead::util::contains_keyword;
///
/// assert!(contains_keyword("Tech News Today", "TECH"));
/// assert!(contains_keyword("Новини технологій", "ТЕХНОЛОГІЙ"));
/// assert!(!contains_keyword("Sports Roundup", "tech"));
/// ```
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}
