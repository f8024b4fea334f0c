//! Diagnostic name derivation for template patterns.

use std::path::Path;

/// Derives a diagnostic name from the file stem of a template pattern.
///
/// Runs of non-word characters collapse into a single `_`, so
/// `icons/btn-ok*.png` becomes `btn_ok_`.
pub(crate) fn name_from_pattern(pattern: &str) -> String {
    let stem = Path::new(pattern)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut out = String::with_capacity(stem.len());
    let mut in_run = false;
    for ch in stem.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}
