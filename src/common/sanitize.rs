// src/common/sanitize.rs

/// Collapse runs of whitespace (including NBSP) into one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Drop a leading label token and whatever separator follows it
/// (`"ФН: 123"` → `"123"`, `"Смена № 5"` → `"5"`).
/// Text without the label comes back trimmed but otherwise unchanged.
pub fn strip_label<'a>(s: &'a str, label: &str) -> &'a str {
    let t = s.trim();
    match t.strip_prefix(label) {
        Some(rest) => rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace()).trim_end(),
        None => t,
    }
}

/// Text after the last occurrence of `marker`, or the whole text if absent.
pub fn after_last<'a>(s: &'a str, marker: &str) -> &'a str {
    match s.rfind(marker) {
        Some(i) => s[i + marker.len()..].trim(),
        None => s.trim(),
    }
}
