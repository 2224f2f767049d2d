//! Import and export of Markdown documents on the local filesystem.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Content type recorded for exported notes.
pub const MARKDOWN_MIME: &str = "text/markdown";

#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid export file name: {0:?}")]
    InvalidName(String),
}

/// Result of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub mime: &'static str,
    pub bytes: usize,
}

/// True when `path` has a `.md` extension (any case).
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Read the whole file as text.
///
/// Invalid UTF-8 is replaced rather than rejected, and a leading byte
/// order mark is dropped.
///
/// # Errors
/// Returns [`FileError::Read`] when the file cannot be read.
pub fn read_file_as_text(path: &Path) -> Result<String, FileError> {
    let bytes = fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

/// Write `text` to `dir/filename`.
///
/// The content goes to a temporary file in `dir` first and is renamed into
/// place, so a failed export never leaves a partial file behind.
///
/// # Errors
/// Returns [`FileError::InvalidName`] when `filename` is not a bare file
/// name, and [`FileError::Write`] on any I/O failure.
pub fn download_text(dir: &Path, filename: &str, text: &str) -> Result<Download, FileError> {
    let name = Path::new(filename);
    if filename.is_empty() || name.file_name().and_then(|n| n.to_str()) != Some(filename) {
        return Err(FileError::InvalidName(filename.to_string()));
    }
    let target = dir.join(filename);
    let write_err = |source| FileError::Write {
        path: target.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&target).map_err(|err| write_err(err.error))?;

    tracing::debug!(path = %target.display(), bytes = text.len(), "exported note");
    Ok(Download {
        path: target,
        mime: MARKDOWN_MIME,
        bytes: text.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_markdown_file_accepts_md_any_case() {
        assert!(is_markdown_file(Path::new("notes.md")));
        assert!(is_markdown_file(Path::new("dir/NOTES.MD")));
        assert!(!is_markdown_file(Path::new("notes.markdown")));
        assert!(!is_markdown_file(Path::new("notes.txt")));
        assert!(!is_markdown_file(Path::new("md")));
    }

    #[test]
    fn test_read_file_as_text_returns_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "# Hi").unwrap();
        assert_eq!(read_file_as_text(&path).unwrap(), "# Hi");
    }

    #[test]
    fn test_read_file_as_text_strips_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.md");
        fs::write(&path, "\u{feff}# Title\n").unwrap();
        assert_eq!(read_file_as_text(&path).unwrap(), "# Title\n");
    }

    #[test]
    fn test_read_file_as_text_replaces_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.md");
        fs::write(&path, [b'o', b'k', 0xff]).unwrap();
        assert_eq!(read_file_as_text(&path).unwrap(), "ok\u{fffd}");
    }

    #[test]
    fn test_read_missing_file_errors() {
        let dir = tempdir().unwrap();
        let err = read_file_as_text(&dir.path().join("missing.md")).unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
    }

    #[test]
    fn test_download_text_writes_verbatim() {
        let dir = tempdir().unwrap();
        let download = download_text(dir.path(), "markdown-note.md", "  body \n").unwrap();
        assert_eq!(download.path, dir.path().join("markdown-note.md"));
        assert_eq!(download.mime, "text/markdown");
        assert_eq!(download.bytes, 8);
        assert_eq!(fs::read_to_string(&download.path).unwrap(), "  body \n");
    }

    #[test]
    fn test_download_text_overwrites_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        download_text(dir.path(), "n.md", "first").unwrap();
        download_text(dir.path(), "n.md", "second").unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("n.md")).unwrap(), "second");
    }

    #[test]
    fn test_download_text_rejects_paths() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            download_text(dir.path(), "../escape.md", "x"),
            Err(FileError::InvalidName(_))
        ));
        assert!(matches!(
            download_text(dir.path(), "", "x"),
            Err(FileError::InvalidName(_))
        ));
    }
}
