use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mediagate_core::{Error, Result};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{SourceKind, StreamSource};

/// A file on local storage, read from offset 0.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    side_file: bool,
    file: Option<File>,
}

impl FileSource {
    /// Primary media file. A missing file is [`Error::PathNotAccessible`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            side_file: false,
            file: None,
        }
    }

    /// Optional side file. A missing file is
    /// [`Error::SideResourceUnavailable`].
    pub fn side_file(path: impl Into<PathBuf>) -> Self {
        Self {
            side_file: true,
            ..Self::new(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> Result<&mut File> {
        let path = &self.path;
        self.file
            .as_mut()
            .ok_or_else(|| Error::handle_state(path.display().to_string(), "file is not open"))
    }
}

/// Stat a file, mapping a failure the same way [`FileSource::open`] does.
pub async fn stat_file(path: &Path, side_file: bool) -> Result<std::fs::Metadata> {
    tokio::fs::metadata(path)
        .await
        .map_err(|e| access_error(path, side_file, e))
}

fn access_error(path: &Path, side_file: bool, source: std::io::Error) -> Error {
    if side_file && source.kind() == ErrorKind::NotFound {
        Error::SideResourceUnavailable {
            path: path.to_path_buf(),
        }
    } else {
        Error::PathNotAccessible {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl StreamSource for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn open(&mut self) -> Result<()> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| access_error(&self.path, self.side_file, e))?;
        self.file = Some(file);
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.file()?.read(buf).await?)
    }

    async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.file()?.seek(pos).await?)
    }

    async fn tell(&mut self) -> Result<u64> {
        Ok(self.file()?.stream_position().await?)
    }

    async fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }

    fn abort(&mut self) {
        self.file = None;
    }
}
