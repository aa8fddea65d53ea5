use async_trait::async_trait;
use mediagate_av::{FileSource, StreamHandle};
use mediagate_core::{ContentObject, Error, Result};

use super::MetadataHandler;

/// Serves a resource's `resFile` (subtitle, fanart, folder art).
///
/// A missing file surfaces as
/// [`Error::SideResourceUnavailable`] when the handle is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideFileHandler;

#[async_trait]
impl MetadataHandler for SideFileHandler {
    async fn serve_content(
        &self,
        object: &ContentObject,
        resource_index: usize,
    ) -> Result<StreamHandle> {
        let resource = object.resource(resource_index).ok_or_else(|| {
            Error::resource_not_found(object.id, format!("no resource {resource_index}"))
        })?;
        let path = resource.resource_file().ok_or_else(|| {
            Error::resource_not_found(
                object.id,
                format!("resource {resource_index} has no side file"),
            )
        })?;
        Ok(StreamHandle::new(FileSource::side_file(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mediagate_core::{attr, HandlerType, OpenMode, Resource};

    #[tokio::test]
    async fn serves_side_file() {
        let dir = tempfile::tempdir().unwrap();
        let srt = dir.path().join("movie.srt");
        std::fs::write(&srt, "1\n00:00:01,000 --> 00:00:02,000\nhi\n").unwrap();

        let obj = ContentObject::item(1u64, "Movie", dir.path().join("movie.mkv"), "video/x-matroska")
            .with_resource(Resource::new(HandlerType::Default))
            .with_resource(
                Resource::new(HandlerType::Subtitle)
                    .with_attribute(attr::RESOURCE_FILE, srt.to_string_lossy()),
            );

        let mut handle = SideFileHandler.serve_content(&obj, 1).await.unwrap();
        assert!(!handle.is_open());
        assert_eq!(handle.probe_length().await.unwrap(), 35);

        assert_matches!(
            SideFileHandler.serve_content(&obj, 0).await,
            Err(Error::ResourceNotFound { .. })
        );
        assert_matches!(
            SideFileHandler.serve_content(&obj, 5).await,
            Err(Error::ResourceNotFound { .. })
        );

        std::fs::remove_file(&srt).unwrap();
        let mut gone = SideFileHandler.serve_content(&obj, 1).await.unwrap();
        assert_matches!(
            gone.open(OpenMode::Read).await,
            Err(Error::SideResourceUnavailable { .. })
        );
    }
}
