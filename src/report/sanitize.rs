//! Filename sanitizing.

pub const MAX_FILENAME_CHARS: usize = 80;

/// Reduce `text` to a filename-safe stem.
///
/// Alphanumerics, `-` and `_` are kept; space and `/` become `_`; everything
/// else is dropped. Leading/trailing underscores are stripped before
/// truncating to [`MAX_FILENAME_CHARS`] characters. May return an empty
/// string.
pub fn sanitize_filename(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if ch == ' ' || ch == '/' {
            out.push('_');
        }
    }
    out.trim_matches('_')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect()
}
