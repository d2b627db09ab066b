//! Buffer I/O collaborator. The engine only ever sees lines; reading,
//! writing and line-ending handling live behind `BufferIo`.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, error};

pub trait BufferIo {
    fn load(&self, path: &Path) -> anyhow::Result<Vec<String>>;
    fn save(&self, path: &Path, lines: &[String]) -> anyhow::Result<()>;
}

/// Local filesystem. Loads normalize CRLF and lone CR to LF; saves write LF
/// with a trailing newline.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsBufferIo;

impl BufferIo for FsBufferIo {
    fn load(&self, path: &Path) -> anyhow::Result<Vec<String>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let norm = normalize_line_endings(&content);
        if norm.mixed {
            debug!(target: "io", path = %path.display(), "mixed_line_endings_normalized");
        }
        let body = norm
            .normalized
            .strip_suffix('\n')
            .unwrap_or(&norm.normalized);
        Ok(body.split('\n').map(str::to_string).collect())
    }

    fn save(&self, path: &Path, lines: &[String]) -> anyhow::Result<()> {
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(path, content.as_bytes()).map_err(|e| {
            error!(target: "io", path = %path.display(), error = %e, "file_write_error");
            anyhow::Error::new(e).context(format!("writing {}", path.display()))
        })
    }
}

pub struct NormalizedText {
    pub normalized: String,         // LF-only content
    pub had_trailing_newline: bool, // original trailing newline presence
    pub mixed: bool,                // more than one line ending style seen
}

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let crlf = input.matches("\r\n").count();
    let cr = input.matches('\r').count() - crlf;
    let lf = input.matches('\n').count() - crlf;
    let mixed = [crlf, lf, cr].iter().filter(|c| **c > 0).count() > 1;
    let had_trailing_newline = input.ends_with('\n') || input.ends_with('\r');
    let normalized = if crlf == 0 && cr == 0 {
        input.to_string()
    } else {
        input.replace("\r\n", "\n").replace('\r', "\n")
    };
    NormalizedText {
        normalized,
        had_trailing_newline,
        mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mixed_endings() {
        let n = normalize_line_endings("a\r\nb\nc\rd");
        assert_eq!(n.normalized, "a\nb\nc\nd");
        assert!(n.mixed);
        assert!(!n.had_trailing_newline);
    }

    #[test]
    fn lf_only_is_untouched() {
        let n = normalize_line_endings("x\ny\n");
        assert_eq!(n.normalized, "x\ny\n");
        assert!(!n.mixed);
        assert!(n.had_trailing_newline);
    }

    #[test]
    fn load_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, "line1\r\nline2\r\n").unwrap();
        let io = FsBufferIo;
        let lines = io.load(&path).unwrap();
        assert_eq!(lines, vec!["line1".to_string(), "line2".to_string()]);
        io.save(&path, &lines).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line1\nline2\n");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsBufferIo.load(&dir.path().join("nope.txt")).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }
}
