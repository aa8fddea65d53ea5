use async_trait::async_trait;
use bytes::Bytes;
use mediagate_av::{MemorySource, StreamHandle};
use mediagate_core::{ContentObject, Result};

use super::MetadataHandler;

/// Serves the same in-memory bytes for every resource, e.g. a placeholder
/// thumbnail or a fixed icon.
#[derive(Debug, Clone)]
pub struct StaticContentHandler {
    mime_type: Option<String>,
    data: Bytes,
}

impl StaticContentHandler {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: None,
            data: data.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[async_trait]
impl MetadataHandler for StaticContentHandler {
    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    async fn serve_content(
        &self,
        object: &ContentObject,
        resource_index: usize,
    ) -> Result<StreamHandle> {
        Ok(StreamHandle::new(MemorySource::new(
            format!("{}/{resource_index}", object.id),
            self.data.clone(),
        )))
    }
}
