use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extensions recognised as markdown sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Swap a recognised source extension for `suffix`, or append `suffix`.
///
/// `suffix` includes its leading dot, e.g. `.tex` or `.tmp0.bib`.
pub fn derived_path(source: &Path, suffix: &str) -> PathBuf {
    let has_source_ext = source
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
    let base = if has_source_ext {
        source.with_extension("")
    } else {
        source.to_path_buf()
    };
    let mut name: OsString = base.into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
