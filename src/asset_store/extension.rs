//! Content-type -> extension guessing, as a static table.
//!
//! Grounded on the `utils/constants.rs` style of hardcoded
//! lookup tables for magic values, generalized from its single
//! `CHROME_USER_AGENT` constant to a small table.

const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("text/html", ".html"),
    ("text/css", ".css"),
    ("application/javascript", ".js"),
    ("text/javascript", ".js"),
    ("application/json", ".json"),
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
    ("image/x-icon", ".ico"),
    ("image/avif", ".avif"),
    ("font/woff2", ".woff2"),
    ("font/woff", ".woff"),
    ("font/ttf", ".ttf"),
    ("application/font-woff2", ".woff2"),
    ("video/mp4", ".mp4"),
    ("audio/mpeg", ".mp3"),
    ("application/pdf", ".pdf"),
    ("application/wasm", ".wasm"),
];

/// Guess a file extension (including the leading dot) from an HTTP
/// content-type, stripping any `; charset=...` parameter first. Returns
/// an empty string when nothing matches, so callers can append it
/// unconditionally.
#[must_use]
pub fn guess_extension(content_type: &str) -> String {
    let base = content_type.split(';').next().unwrap_or(content_type).trim().to_lowercase();
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(ct, _)| *ct == base)
        .map(|(_, ext)| (*ext).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_charset_parameter() {
        assert_eq!(guess_extension("text/html; charset=utf-8"), ".html");
    }

    #[test]
    fn unknown_type_yields_empty_string() {
        assert_eq!(guess_extension("application/x-unknown-thing"), "");
    }
}
