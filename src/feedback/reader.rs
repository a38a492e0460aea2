//! Turns a captured image reference into base64 text for the payload.

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

use super::ImageRef;

#[derive(Error, Debug)]
pub(crate) enum ReadError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) trait FileReader {
    async fn read_base64(&self, image: &ImageRef) -> Result<String, ReadError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FsFileReader;

impl FileReader for FsFileReader {
    async fn read_base64(&self, image: &ImageRef) -> Result<String, ReadError> {
        let path = image.to_path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ReadError::Io {
                path: path.clone(),
                source,
            })?;

        // An empty file encodes to an empty string and is still sent.
        Ok(BASE64.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_file_as_standard_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, [0x01, 0x02, 0x03, 0xff]).unwrap();

        let encoded = FsFileReader
            .read_base64(&ImageRef::from(path.as_path()))
            .await
            .unwrap();

        assert_eq!(encoded, "AQID/w==");
    }

    #[tokio::test]
    async fn test_empty_file_encodes_to_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, []).unwrap();

        let encoded = FsFileReader
            .read_base64(&ImageRef::from(path.as_path()))
            .await
            .unwrap();

        assert_eq!(encoded, "");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = FsFileReader
            .read_base64(&ImageRef::new("file:///definitely/not/here.png"))
            .await
            .unwrap_err();

        match err {
            ReadError::Io { path, .. } => assert_eq!(path, PathBuf::from("/definitely/not/here.png")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
