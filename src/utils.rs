use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

/// Entries whose name starts with this character are hidden.
pub const HIDDEN_MARKER: char = '.';

/// Whether a single path segment names a hidden entry.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(HIDDEN_MARKER)
}

/// Strips `base_path` from `path` for display, falling back to the full path.
pub fn display_relative<'a>(path: &'a Path, base_path: &Path) -> &'a Path {
    match path.strip_prefix(base_path) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative,
        _ => path,
    }
}

pub fn format_human_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    match secs {
        3600.. => format!(
            "{}:{:02}:{:02}.{millis:03} (h:mm:ss.mmm)",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ),
        60.. => format!("{}:{:02}.{millis:03} (m:ss.mmm)", secs / 60, secs % 60),
        _ => format!("{secs}.{millis:03} seconds"),
    }
}
