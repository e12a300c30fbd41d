//! Upload storage module
//!
//! Owns the on-disk layout: one flat directory, one file per accepted upload,
//! named `<unix-seconds>_<original-filename>`.

use std::io;
use std::path::{Path, PathBuf};

/// Ensure the upload directory and any missing parents exist (mode 0755 on Unix)
pub fn ensure_upload_dir(dir: &Path) -> io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    builder.create(dir)
}

/// Build the stored file name for an upload received at `timestamp`.
///
/// The original name is used verbatim unless `sanitize` is set, in which case
/// only its final path component survives. Returns `None` when sanitizing
/// leaves nothing usable.
pub fn build_filename(timestamp: i64, original: &str, sanitize: bool) -> Option<String> {
    let name = if sanitize {
        sanitize_filename(original)?
    } else {
        original
    };
    Some(format!("{timestamp}_{name}"))
}

/// Full destination path for a stored file name
pub fn destination_path(upload_dir: &Path, filename: &str) -> PathBuf {
    upload_dir.join(filename)
}

/// Reduce a client-supplied name to its last component, rejecting `.` and `..`
fn sanitize_filename(name: &str) -> Option<&str> {
    let basename = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if basename.is_empty() || basename == "." || basename == ".." {
        return None;
    }
    Some(basename)
}
