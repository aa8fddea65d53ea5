//! Content model: objects, resources, resource handler types, and the small
//! value types shared by the request pipeline and the stream layer.
//!
//! Objects are owned by the content repository; the pipeline only ever holds
//! shared references for the duration of one request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::ids::ObjectId;

/// Well-known resource attribute keys.
pub mod attr {
    /// `protocol:network:mime:extra` string consumed by streaming clients.
    pub const PROTOCOL_INFO: &str = "protocolInfo";
    /// Path of an independently stored side file (subtitle, fanart, ...).
    pub const RESOURCE_FILE: &str = "resFile";
    pub const SAMPLE_FREQUENCY: &str = "sampleFrequency";
    pub const NR_AUDIO_CHANNELS: &str = "nrAudioChannels";
    pub const VIDEO_CODEC: &str = "videoCodec";
    pub const AUDIO_CODEC: &str = "audioCodec";
    pub const SIZE: &str = "size";
    pub const DURATION: &str = "duration";
    pub const RESOLUTION: &str = "resolution";
}

// ---------------------------------------------------------------------------
// HandlerType
// ---------------------------------------------------------------------------

/// Producer responsible for a resource's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerType {
    #[default]
    Default,
    LibExif,
    Id3,
    Transcode,
    ExtUrl,
    Mp4,
    FfmpegThumbnailer,
    Flac,
    Fanart,
    Matroska,
    Subtitle,
    ContainerArt,
    Resource,
}

impl HandlerType {
    pub const ALL: [HandlerType; 13] = [
        Self::Default,
        Self::LibExif,
        Self::Id3,
        Self::Transcode,
        Self::ExtUrl,
        Self::Mp4,
        Self::FfmpegThumbnailer,
        Self::Flac,
        Self::Fanart,
        Self::Matroska,
        Self::Subtitle,
        Self::ContainerArt,
        Self::Resource,
    ];

    /// Stable numeric id used in request URLs.
    pub fn id(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::LibExif => 1,
            Self::Id3 => 2,
            Self::Transcode => 3,
            Self::ExtUrl => 4,
            Self::Mp4 => 5,
            Self::FfmpegThumbnailer => 6,
            Self::Flac => 7,
            Self::Fanart => 8,
            Self::Matroska => 9,
            Self::Subtitle => 10,
            Self::ContainerArt => 11,
            Self::Resource => 20,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::LibExif => "libexif",
            Self::Id3 => "id3",
            Self::Transcode => "transcode",
            Self::ExtUrl => "exturl",
            Self::Mp4 => "mp4",
            Self::FfmpegThumbnailer => "ffmpegthumbnailer",
            Self::Flac => "flac",
            Self::Fanart => "fanart",
            Self::Matroska => "matroska",
            Self::Subtitle => "subtitle",
            Self::ContainerArt => "containerart",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandlerType {
    type Err = Error;

    /// Accepts either the numeric id or the name (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u8>() {
            return Self::from_id(id)
                .ok_or_else(|| Error::parameter(format!("unknown resource handler id {id}")));
        }
        Self::ALL
            .into_iter()
            .find(|h| h.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::parameter(format!("unknown resource handler '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// An addressable attachment of a content object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Position within the owning object; assigned by the object.
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub handler_type: HandlerType,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Resource {
    pub fn new(handler_type: HandlerType) -> Self {
        Self {
            index: 0,
            handler_type,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute value, treating empty strings as absent.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn protocol_info(&self) -> Option<&str> {
        self.attribute(attr::PROTOCOL_INFO)
    }

    /// Side file backing this resource, if it is stored independently.
    pub fn resource_file(&self) -> Option<&Path> {
        self.attribute(attr::RESOURCE_FILE).map(Path::new)
    }

    pub fn is_resource_file(&self) -> bool {
        self.resource_file().is_some()
    }
}

// ---------------------------------------------------------------------------
// ContentObject
// ---------------------------------------------------------------------------

/// Kind-specific part of a content object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectKind {
    /// A single playable media asset stored at `location`.
    Item { location: PathBuf },
    /// A folder-like grouping without playable bytes.
    Container,
}

/// A browsable object of the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ObjectRecord")]
pub struct ContentObject {
    pub id: ObjectId,
    pub title: String,
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub kind: ObjectKind,
    resources: Vec<Resource>,
}

/// Wire shape of [`ContentObject`]; resource indices are reassigned on load.
#[derive(Deserialize)]
struct ObjectRecord {
    id: ObjectId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(flatten)]
    kind: ObjectKind,
    #[serde(default)]
    resources: Vec<Resource>,
}

impl From<ObjectRecord> for ContentObject {
    fn from(r: ObjectRecord) -> Self {
        let mut obj = ContentObject {
            id: r.id,
            title: r.title,
            mime_type: r.mime_type.filter(|m| !m.is_empty()),
            kind: r.kind,
            resources: Vec::with_capacity(r.resources.len()),
        };
        for res in r.resources {
            obj.push_resource(res);
        }
        obj
    }
}

impl ContentObject {
    pub fn item(
        id: impl Into<ObjectId>,
        title: impl Into<String>,
        location: impl Into<PathBuf>,
        mime_type: impl Into<String>,
    ) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: id.into(),
            title: title.into(),
            mime_type: (!mime_type.is_empty()).then_some(mime_type),
            kind: ObjectKind::Item {
                location: location.into(),
            },
            resources: Vec::new(),
        }
    }

    pub fn container(id: impl Into<ObjectId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            mime_type: None,
            kind: ObjectKind::Container,
            resources: Vec::new(),
        }
    }

    /// Append a resource, assigning it the next index.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.push_resource(resource);
        self
    }

    fn push_resource(&mut self, mut resource: Resource) {
        resource.index = self.resources.len();
        self.resources.push(resource);
    }

    pub fn is_item(&self) -> bool {
        matches!(self.kind, ObjectKind::Item { .. })
    }

    /// Location of the media file; `None` for containers.
    pub fn location(&self) -> Option<&Path> {
        match &self.kind {
            ObjectKind::Item { location } => Some(location),
            ObjectKind::Container => None,
        }
    }

    /// Location of the media file, failing with [`Error::NotAnItem`] for
    /// containers.
    pub fn require_item(&self) -> Result<&Path> {
        self.location().ok_or_else(|| Error::not_an_item(self.id))
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, index: usize) -> Option<&Resource> {
        self.resources.get(index)
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// The resource describing the primary media stream.
    pub fn primary_resource(&self) -> Option<&Resource> {
        self.resources.first()
    }
}

// ---------------------------------------------------------------------------
// ByteRange
// ---------------------------------------------------------------------------

/// Inclusive byte range requested for a transcoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl FromStr for ByteRange {
    type Err = Error;

    /// Parses `start-end` or `start-`, optionally prefixed with `bytes=`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::parameter(format!("invalid range '{s}'"));
        let text = s.trim();
        let text = text.strip_prefix("bytes=").unwrap_or(text);
        let (start, end) = text.split_once('-').ok_or_else(invalid)?;
        let start: u64 = start.trim().parse().map_err(|_| invalid())?;
        let end = match end.trim() {
            "" => None,
            e => Some(e.parse::<u64>().map_err(|_| invalid())?),
        };
        if matches!(end, Some(e) if e < start) {
            return Err(invalid());
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

// ---------------------------------------------------------------------------
// OpenMode
// ---------------------------------------------------------------------------

/// Access mode requested by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    Read,
    Write,
}

impl OpenMode {
    /// Fails with [`Error::UnsupportedWriteMode`] for anything but reads.
    pub fn ensure_read(self) -> Result<()> {
        match self {
            Self::Read => Ok(()),
            Self::Write => Err(Error::UnsupportedWriteMode),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn handler_type_from_id_and_name() {
        assert_eq!("8".parse::<HandlerType>().unwrap(), HandlerType::Fanart);
        assert_eq!("Subtitle".parse::<HandlerType>().unwrap(), HandlerType::Subtitle);
        assert_eq!("20".parse::<HandlerType>().unwrap(), HandlerType::Resource);
        assert_matches!("12".parse::<HandlerType>(), Err(Error::Parameter(_)));
        assert_matches!("bogus".parse::<HandlerType>(), Err(Error::Parameter(_)));
    }

    #[test]
    fn handler_ids_are_unique() {
        for h in HandlerType::ALL {
            assert_eq!(HandlerType::from_id(h.id()), Some(h));
        }
    }

    #[test]
    fn resource_indices_follow_insertion_order() {
        let obj = ContentObject::item(1u64, "Song", "/music/song.flac", "audio/flac")
            .with_resource(Resource::new(HandlerType::Default))
            .with_resource(Resource::new(HandlerType::Fanart));
        assert_eq!(obj.resource(0).unwrap().index, 0);
        assert_eq!(obj.resource(1).unwrap().index, 1);
        assert_eq!(obj.resource(1).unwrap().handler_type, HandlerType::Fanart);
        assert!(obj.resource(2).is_none());
    }

    #[test]
    fn empty_attribute_is_absent() {
        let res = Resource::new(HandlerType::Subtitle).with_attribute(attr::RESOURCE_FILE, "");
        assert!(!res.is_resource_file());
        assert_eq!(res.attribute(attr::RESOURCE_FILE), None);
    }

    #[test]
    fn container_is_not_an_item() {
        let obj = ContentObject::container(5u64, "Albums");
        assert!(!obj.is_item());
        assert_matches!(obj.require_item(), Err(Error::NotAnItem { id }) if id == "5");
    }

    #[test]
    fn deserialize_item_reassigns_indices() {
        let json = r#"{
            "id": 12,
            "title": "Movie",
            "mime_type": "video/x-matroska",
            "kind": "item",
            "location": "/media/movie.mkv",
            "resources": [
                {"index": 7, "attributes": {"videoCodec": "h264"}},
                {"handler_type": "subtitle", "attributes": {"resFile": "/media/movie.srt"}}
            ]
        }"#;
        let obj: ContentObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.location(), Some(Path::new("/media/movie.mkv")));
        assert_eq!(obj.resource(0).unwrap().index, 0);
        assert_eq!(obj.resource(1).unwrap().index, 1);
        assert_eq!(
            obj.resource(1).unwrap().resource_file(),
            Some(Path::new("/media/movie.srt"))
        );
    }

    #[test]
    fn deserialize_container() {
        let obj: ContentObject =
            serde_json::from_str(r#"{"id": 3, "title": "Music", "kind": "container"}"#).unwrap();
        assert_eq!(obj.kind, ObjectKind::Container);
        assert_eq!(obj.resource_count(), 0);
    }

    #[test]
    fn byte_range_forms() {
        assert_eq!(
            "0-499".parse::<ByteRange>().unwrap(),
            ByteRange { start: 0, end: Some(499) }
        );
        assert_eq!(
            "bytes=500-".parse::<ByteRange>().unwrap(),
            ByteRange { start: 500, end: None }
        );
        assert_eq!("500-".parse::<ByteRange>().unwrap().to_string(), "500-");
        assert_matches!("10-5".parse::<ByteRange>(), Err(Error::Parameter(_)));
        assert_matches!("-500".parse::<ByteRange>(), Err(Error::Parameter(_)));
        assert_matches!("abc".parse::<ByteRange>(), Err(Error::Parameter(_)));
    }

    #[test]
    fn write_mode_rejected() {
        assert!(OpenMode::Read.ensure_read().is_ok());
        assert_matches!(OpenMode::Write.ensure_read(), Err(Error::UnsupportedWriteMode));
    }
}
