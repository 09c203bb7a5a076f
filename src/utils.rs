//! Utility functions for file operations and path manipulation

use crate::error::Result;
use std::path::Path;

/// Make a string safe to use as a single path component
///
/// - `/` and `\` become `-`
/// - `< > : " | ? *` and control characters are removed
/// - leading whitespace and trailing dots or whitespace are trimmed
/// - an empty result becomes `untitled`
///
/// # Examples
///
/// ```
/// use replay_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Show - S01E02 - Who?"), "Show - S01E02 - Who");
/// assert_eq!(sanitize_filename("AC/DC: Live"), "AC-DC Live");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('-'),
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();

    let trimmed = cleaned
        .trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Move a file into place
///
/// Tries a plain rename first. When source and destination live on different
/// filesystems the file is copied to a `.part` sibling of the destination and
/// renamed over it, so the destination never holds a partial file.
pub async fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::rename(source, destination).await {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                ?source,
                ?destination,
                "rename crosses filesystems, falling back to copy"
            );
        }
        Err(e) => return Err(e.into()),
    }

    let mut partial = destination.as_os_str().to_owned();
    partial.push(".part");
    let partial = std::path::PathBuf::from(partial);

    tokio::fs::copy(source, &partial).await?;
    tokio::fs::rename(&partial, destination).await?;
    tokio::fs::remove_file(source).await?;
    Ok(())
}
