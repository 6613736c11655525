use std::sync::OnceLock;

use regex::Regex;

const UNKNOWN: &str = "N/A";

fn leading_duration() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?-u:^\d+-\d+\s+\w+|^\d+\s+\w+)").expect("time estimate pattern is valid")
    })
}

/// Short label for a generated time estimate such as "4-6 weeks, depending on practice".
/// Keeps a leading "N unit" / "N-M unit" when present, otherwise the text before the
/// first comma or parenthesis. Digits and unit letters are ASCII only, and the leading
/// pattern must start at the very first character.
pub fn short_time_label(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return UNKNOWN.to_string();
    };

    if let Some(found) = leading_duration().find(raw) {
        return found.as_str().to_string();
    }

    let head = raw.split(',').next().unwrap_or(raw);
    let head = head.split('(').next().unwrap_or(head).trim();
    if head.is_empty() {
        UNKNOWN.to_string()
    } else {
        head.to_string()
    }
}
