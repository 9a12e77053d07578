//! Temporary on-disk staging of upload bytes.
//!
//! A [`StagedAsset`] lives for one upload call. Dropping it removes the file,
//! whether the upload succeeded or not.

use std::path::Path;

use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio_util::io::ReaderStream;

pub struct StagedAsset {
    file: NamedTempFile,
    len: u64,
}

impl StagedAsset {
    pub async fn stage(content: &Bytes) -> std::io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("slide-library-")
            .tempfile()?;
        tokio::fs::write(file.path(), content).await?;

        Ok(Self {
            file,
            len: content.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.len
    }

    /// A request body streaming the staged bytes from disk.
    pub async fn body(&self) -> std::io::Result<reqwest::Body> {
        let file = tokio::fs::File::open(self.path()).await?;
        Ok(reqwest::Body::wrap_stream(ReaderStream::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_writes_and_drop_removes() {
        let staged = StagedAsset::stage(&Bytes::from_static(b"slide bytes"))
            .await
            .unwrap();
        let path = staged.path().to_path_buf();

        assert_eq!(staged.size(), 11);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"slide bytes");

        drop(staged);
        assert!(!path.exists());
    }
}
