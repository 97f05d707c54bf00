use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Read access to the copy of a secret persisted by the previous mount.
#[async_trait]
pub trait LocalCopy: Send + Sync {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads the previously mounted file straight from the mount directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLocalCopy;

#[async_trait]
impl LocalCopy for FsLocalCopy {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}
