//! Saving generated certificates

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Destination for rendered certificate PDFs
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Save `bytes` under `file_name`, returning where they went
    async fn save(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf>;
}

/// Writes certificates into a local directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    /// Existing files are never replaced; a taken name gets a ` (n)` suffix
    async fn save(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let file_name = safe_file_name(file_name);

        for attempt in 0usize.. {
            let path = self.directory.join(numbered_file_name(&file_name, attempt));
            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            file.write_all(bytes).await?;
            file.flush().await?;
            tracing::info!(path = %path.display(), "Saved certificate");
            return Ok(path);
        }

        Err(io::Error::new(ErrorKind::AlreadyExists, "no free file name"))
    }
}

/// `name.pdf`, then `name (1).pdf`, `name (2).pdf`, ...
fn numbered_file_name(file_name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{file_name} ({attempt})"),
    }
}

/// Keep a registration-derived name inside the target directory
fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}
