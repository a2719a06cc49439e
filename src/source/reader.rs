// file: src/source/reader.rs
// description: document reading seam used by per-file processing

use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Raw io errors are returned untouched so callers can decide what to retry.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, path: &Path) -> io::Result<String>;
}

#[derive(Debug, Clone, Default)]
pub struct FsDocumentReader;

#[async_trait]
impl DocumentReader for FsDocumentReader {
    async fn read(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
