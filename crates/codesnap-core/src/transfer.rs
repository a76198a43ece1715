//! Moving files between the host filesystem and the workspace.
//!
//! Reading a host file is the only suspending step of an import; turning
//! the decoded text into a workspace file is synchronous and happens in
//! [`Session::import`](crate::session::Session::import).

use std::path::{Path, PathBuf};

use crate::file::File;
use crate::{CoreError, CoreResult};

/// Extensions offered by the import picker. Others are still accepted
/// and classified with the default language.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["py", "js", "java", "c", "txt"];

/// A file handed over by the host, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl HostFile {
    /// Wraps raw bytes received from the host.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk.
    pub async fn read(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("untitled")
            .to_string();

        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Self { name, bytes }),
            Err(e) => Err(CoreError::Import {
                name,
                message: format!("Failed to read file: {e}"),
            }),
        }
    }

    /// Returns true if the picker would offer this file.
    pub fn is_supported(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }

    /// Decodes the contents as UTF-8 text. A leading byte order mark is
    /// dropped; any invalid sequence is an error.
    pub fn decode(&self) -> CoreResult<String> {
        let bytes = self
            .bytes
            .strip_prefix(b"\xEF\xBB\xBF".as_slice())
            .unwrap_or(&self.bytes[..]);

        String::from_utf8(bytes.to_vec()).map_err(|e| CoreError::Import {
            name: self.name.clone(),
            message: format!("File is not valid UTF-8 text: {e}"),
        })
    }
}

/// A downloadable copy of a workspace file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Same as the source file's name
    pub file_name: String,
    pub content: String,
}

impl Export {
    /// Captures the current content of `file`.
    pub fn from_file(file: &File) -> Self {
        Self {
            file_name: file.name.clone(),
            content: file.content.clone(),
        }
    }

    /// Writes the export into `dir` and returns the written path.
    ///
    /// Only the final component of the file name is used, so a name like
    /// `../x.py` cannot escape `dir`.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> CoreResult<PathBuf> {
        let name = Path::new(&self.file_name).file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Cannot export a file named {:?}", self.file_name),
            )
        })?;

        let path = dir.as_ref().join(name);
        tokio::fs::write(&path, self.content.as_bytes()).await?;
        Ok(path)
    }
}
