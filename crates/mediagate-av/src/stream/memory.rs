use std::io::SeekFrom;

use async_trait::async_trait;
use bytes::Bytes;
use mediagate_core::{Error, Result};

use super::{SourceKind, StreamSource};

/// Bytes produced in memory, e.g. embedded album art or a generated caption.
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    data: Bytes,
    pos: u64,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
            pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl StreamSource for MemorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Memory
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }

    async fn open(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = self.data.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let len = self.data.len() as i128;
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(d) => len + d as i128,
            SeekFrom::Current(d) => self.pos as i128 + d as i128,
        };
        if target < 0 {
            return Err(Error::handle_state(
                self.describe(),
                "seek before start of stream",
            ));
        }
        // Seeking past the end is allowed, reads then return EOF.
        self.pos = target as u64;
        Ok(self.pos)
    }

    async fn tell(&mut self) -> Result<u64> {
        Ok(self.pos)
    }

    async fn close(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn seek_and_read() {
        let mut src = MemorySource::new("art", Bytes::from_static(b"abcdef"));
        src.open().await.unwrap();
        assert_eq!(src.seek(SeekFrom::End(-2)).await.unwrap(), 4);
        let mut buf = [0u8; 10];
        assert_eq!(src.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(src.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn negative_seek_rejected() {
        let mut src = MemorySource::new("art", "abc");
        src.open().await.unwrap();
        assert_matches!(
            src.seek(SeekFrom::Current(-1)).await,
            Err(Error::HandleState { .. })
        );
    }
}
