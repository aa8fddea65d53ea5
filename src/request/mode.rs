//! Delivery mode selection.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use mediagate_core::{ByteRange, ContentObject, HandlerType, Resource, Result};
use serde::Serialize;

use super::params::RequestParameters;
use super::resolve::locate_resource;

/// How the bytes of a request are produced.
#[derive(Debug, Clone)]
pub enum DeliveryMode {
    /// A metadata handler produces the bytes of one resource.
    MetadataResource {
        object: Arc<ContentObject>,
        resource_index: usize,
        handler: HandlerType,
    },
    /// An external transcoder converts the item on the fly.
    Transcoded {
        object: Arc<ContentObject>,
        profile: String,
        range: Option<ByteRange>,
    },
    /// A file is served as is: the item's media file, or a side file
    /// addressed by an explicit resource index.
    DirectFile {
        object: Arc<ContentObject>,
        path: PathBuf,
        side_file: bool,
    },
}

/// Discriminant of [`DeliveryMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    MetadataResource,
    Transcoded,
    DirectFile,
}

impl fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MetadataResource => write!(f, "metadata_resource"),
            Self::Transcoded => write!(f, "transcoded"),
            Self::DirectFile => write!(f, "direct_file"),
        }
    }
}

impl DeliveryMode {
    pub fn kind(&self) -> DeliveryKind {
        match self {
            Self::MetadataResource { .. } => DeliveryKind::MetadataResource,
            Self::Transcoded { .. } => DeliveryKind::Transcoded,
            Self::DirectFile { .. } => DeliveryKind::DirectFile,
        }
    }

    pub fn object(&self) -> &ContentObject {
        match self {
            Self::MetadataResource { object, .. }
            | Self::Transcoded { object, .. }
            | Self::DirectFile { object, .. } => object,
        }
    }

    /// The addressed resource of a metadata request.
    pub fn resource(&self) -> Option<&Resource> {
        match self {
            Self::MetadataResource {
                object,
                resource_index,
                ..
            } => object.resource(*resource_index),
            _ => None,
        }
    }
}

/// Pick the delivery mode. First match wins:
///
/// 1. a resource handler is named: metadata resource;
/// 2. an explicit `res_id` addresses a resource with a side file: that
///    file, served directly and never transcoded;
/// 3. a profile is named: transcoded stream;
/// 4. otherwise the item's own media file.
///
/// Without an explicit index the primary resource is only consulted for
/// its attributes, so a side file on it never suppresses transcoding.
///
/// A container addressed without a handler is always
/// [`Error::NotAnItem`](mediagate_core::Error::NotAnItem).
pub fn select_mode(
    params: &RequestParameters,
    object: Arc<ContentObject>,
) -> Result<DeliveryMode> {
    if let Some(handler) = params.resource_handler {
        let resource_index = locate_resource(params, &object)?
            .map(|r| r.index)
            .unwrap_or_default();
        return Ok(DeliveryMode::MetadataResource {
            object,
            resource_index,
            handler,
        });
    }

    let location = object.require_item()?.to_path_buf();
    let current = locate_resource(params, &object)?;
    // Only an explicitly addressed resource can redirect to its side file.
    let side_file = params
        .resource_index
        .and(current)
        .and_then(Resource::resource_file)
        .map(PathBuf::from);

    if let Some(path) = side_file {
        return Ok(DeliveryMode::DirectFile {
            object,
            path,
            side_file: true,
        });
    }

    if let Some(profile) = &params.transcode_profile {
        return Ok(DeliveryMode::Transcoded {
            profile: profile.clone(),
            range: params.range,
            object,
        });
    }

    Ok(DeliveryMode::DirectFile {
        object,
        path: location,
        side_file: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mediagate_core::{attr, Error};

    fn params(path: &str) -> RequestParameters {
        RequestParameters::parse(path).unwrap()
    }

    fn movie() -> Arc<ContentObject> {
        Arc::new(
            ContentObject::item(5u64, "Movie", "/media/movie.mkv", "video/x-matroska")
                .with_resource(Resource::new(HandlerType::Default))
                .with_resource(
                    Resource::new(HandlerType::Subtitle)
                        .with_attribute(attr::RESOURCE_FILE, "/media/movie.srt"),
                ),
        )
    }

    #[test]
    fn handler_means_metadata_resource() {
        let mode = select_mode(&params("object_id/5/rh/10/res_id/1/pr_name/x"), movie()).unwrap();
        assert_matches!(
            mode,
            DeliveryMode::MetadataResource { resource_index: 1, handler: HandlerType::Subtitle, .. }
        );
    }

    #[test]
    fn profile_means_transcoded() {
        let mode = select_mode(&params("object_id/5/pr_name/mp3/range/10-"), movie()).unwrap();
        assert_matches!(
            mode,
            DeliveryMode::Transcoded { ref profile, range: Some(ByteRange { start: 10, end: None }), .. }
                if profile == "mp3"
        );
    }

    #[test]
    fn side_file_is_never_transcoded() {
        let mode = select_mode(&params("object_id/5/res_id/1/pr_name/mp3"), movie()).unwrap();
        assert_matches!(
            mode,
            DeliveryMode::DirectFile { ref path, side_file: true, .. }
                if path.as_os_str() == "/media/movie.srt"
        );
    }

    #[test]
    fn plain_item_is_direct_file() {
        let mode = select_mode(&params("object_id/5"), movie()).unwrap();
        assert_eq!(mode.kind(), DeliveryKind::DirectFile);
        assert_matches!(
            mode,
            DeliveryMode::DirectFile { ref path, side_file: false, .. }
                if path.as_os_str() == "/media/movie.mkv"
        );
    }

    #[test]
    fn primary_side_file_does_not_block_transcoding() {
        let cover = Arc::new(
            ContentObject::item(7u64, "Track", "/music/track.flac", "audio/flac").with_resource(
                Resource::new(HandlerType::Fanart).with_attribute(attr::RESOURCE_FILE, "/music/cover.jpg"),
            ),
        );
        assert_matches!(
            select_mode(&params("object_id/7/pr_name/pcm"), cover.clone()),
            Ok(DeliveryMode::Transcoded { ref profile, .. }) if profile == "pcm"
        );
        assert_matches!(
            select_mode(&params("object_id/7/res_id/0/pr_name/pcm"), cover),
            Ok(DeliveryMode::DirectFile { side_file: true, .. })
        );
    }

    #[test]
    fn container_without_handler_is_not_an_item() {
        let albums = Arc::new(
            ContentObject::container(2u64, "Albums")
                .with_resource(Resource::new(HandlerType::ContainerArt)),
        );
        for path in ["object_id/2", "object_id/2/pr_name/mp3", "object_id/2/res_id/9"] {
            assert_matches!(
                select_mode(&params(path), albums.clone()),
                Err(Error::NotAnItem { .. }),
                "path {path}"
            );
        }
        assert_matches!(
            select_mode(&params("object_id/2/rh/11/res_id/0"), albums),
            Ok(DeliveryMode::MetadataResource { .. })
        );
    }
}
