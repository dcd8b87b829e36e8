use unicode_normalization::UnicodeNormalization;

/// Reduces a client-supplied filename to a safe, flat ASCII name.
///
/// The name is NFKD-normalized so accented letters keep their base letter,
/// then any remaining non-ASCII is dropped. Path separators become spaces, whitespace
/// runs collapse to `_`, anything outside `[A-Za-z0-9_.-]` is removed, and
/// leading/trailing `.` and `_` are stripped. May return an empty string.
pub fn secure_filename(raw: &str) -> String {
    let ascii: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
