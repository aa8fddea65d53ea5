//! Configuration types.
//!
//! The top-level [`Config`] is deserialized from TOML by the application and
//! carries the settings the request pipeline consults: transcoding profiles,
//! the MIME to content-type table, and the DLNA header switches. Every section
//! defaults sensibly so an empty file is valid.
//!
//! The pipeline reads configuration only through [`ConfigProvider`], so other
//! configuration backends can be injected.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::error::{Error, Result};

/// Content-type token marking raw PCM audio in the MIME mapping.
pub const CONTENT_TYPE_PCM: &str = "pcm";

/// Read-only configuration lookups used by the request pipeline.
pub trait ConfigProvider: Send + Sync {
    /// Profile with exactly this name, if configured and transcoding is on.
    fn transcoding_profile(&self, name: &str) -> Option<&TranscodingProfile>;

    /// MIME type to content-type token mapping.
    fn mime_content_types(&self) -> &BTreeMap<String, String>;

    /// Whether DLNA content-features and transfer-mode headers are emitted.
    fn extend_protocol_info(&self) -> bool;

    /// Global default for chunked transcoder output.
    fn chunked_transfer(&self) -> bool;

    /// DLNA profile name for a content type and the primary stream's codecs.
    fn dlna_profile(
        &self,
        content_type: &str,
        video_codec: Option<&str>,
        audio_codec: Option<&str>,
    ) -> Option<&str>;

    /// How long a transcoder gets to exit after SIGTERM before it is killed.
    fn termination_grace(&self) -> Duration;

    /// Content-type token for a MIME type.
    fn content_type_for(&self, mime_type: &str) -> Option<&str> {
        self.mime_content_types().get(mime_type).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub transcoding: TranscodingConfig,
    pub mappings: MappingsConfig,
}

impl Config {
    /// Reject configurations the pipeline cannot work with.
    pub fn check(&self) -> Result<()> {
        let mut names = HashSet::new();
        for (i, profile) in self.transcoding.profiles.iter().enumerate() {
            if profile.name.trim().is_empty() {
                return Err(Error::Config(format!(
                    "transcoding.profiles[{i}] has an empty name"
                )));
            }
            if !names.insert(profile.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate transcoding profile '{}'",
                    profile.name
                )));
            }
            if profile.command.trim().is_empty() {
                return Err(Error::Config(format!(
                    "transcoding profile '{}' has no command",
                    profile.name
                )));
            }
            if profile.mime_type.trim().is_empty() {
                return Err(Error::Config(format!(
                    "transcoding profile '{}' has no mime_type",
                    profile.name
                )));
            }
        }

        for (mime, content_type) in &self.mappings.mimetype_contenttype {
            if mime.trim().is_empty() || content_type.trim().is_empty() {
                return Err(Error::Config(format!(
                    "empty entry in mappings.mimetype_contenttype ('{mime}' -> '{content_type}')"
                )));
            }
        }

        Ok(())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.transcoding.enabled && !self.transcoding.profiles.is_empty() {
            warnings.push(
                "transcoding is disabled; configured profiles will not be used".into(),
            );
        }

        for profile in &self.transcoding.profiles {
            if !self.mappings.mimetype_contenttype.contains_key(&profile.mime_type) {
                warnings.push(format!(
                    "profile '{}' targets '{}' which has no content-type mapping",
                    profile.name, profile.mime_type
                ));
            }
            if !profile.args.iter().any(|a| a.contains("{input}")) {
                warnings.push(format!(
                    "profile '{}' never references {{input}}",
                    profile.name
                ));
            }
        }

        warnings
    }
}

impl ConfigProvider for Config {
    fn transcoding_profile(&self, name: &str) -> Option<&TranscodingProfile> {
        if !self.transcoding.enabled {
            return None;
        }
        self.transcoding.profiles.iter().find(|p| p.name == name)
    }

    fn mime_content_types(&self) -> &BTreeMap<String, String> {
        &self.mappings.mimetype_contenttype
    }

    fn extend_protocol_info(&self) -> bool {
        self.server.extend_protocol_info
    }

    fn chunked_transfer(&self) -> bool {
        self.transcoding.chunked_transfer
    }

    fn dlna_profile(
        &self,
        content_type: &str,
        video_codec: Option<&str>,
        audio_codec: Option<&str>,
    ) -> Option<&str> {
        self.mappings
            .dlna_profiles
            .iter()
            .find(|rule| rule.matches(content_type, video_codec, audio_codec))
            .map(|rule| rule.profile.as_str())
    }

    fn termination_grace(&self) -> Duration {
        Duration::from_millis(self.transcoding.termination_grace_ms)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub extend_protocol_info: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            extend_protocol_info: true,
        }
    }
}

/// On-the-fly transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodingConfig {
    pub enabled: bool,
    pub chunked_transfer: bool,
    pub termination_grace_ms: u64,
    pub profiles: Vec<TranscodingProfile>,
}

impl Default for TranscodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunked_transfer: true,
            termination_grace_ms: 2000,
            profiles: Vec::new(),
        }
    }
}

/// What happens to a transcoder's stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StderrMode {
    /// Forward each line to `tracing` at trace level.
    #[default]
    Log,
    Discard,
}

/// A named recipe for converting an item on the fly.
///
/// `args` are templates; see the stream crate for the placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodingProfile {
    pub name: String,
    /// MIME type of the transcoder's output.
    pub mime_type: String,
    /// Executable name (looked up in `PATH`) or path.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Overrides `transcoding.chunked_transfer` for this profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunked: Option<bool>,
    #[serde(default)]
    pub stderr: StderrMode,
}

impl TranscodingProfile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            command: command.into(),
            args: Vec::new(),
            chunked: None,
            stderr: StderrMode::default(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Whether output is sent chunked, given the global default.
    pub fn is_chunked(&self, global_default: bool) -> bool {
        self.chunked.unwrap_or(global_default)
    }
}

/// Lookup tables keyed by MIME type / content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingsConfig {
    pub mimetype_contenttype: BTreeMap<String, String>,
    pub dlna_profiles: Vec<DlnaProfileRule>,
}

impl Default for MappingsConfig {
    fn default() -> Self {
        Self {
            mimetype_contenttype: default_mimetype_contenttype(),
            dlna_profiles: default_dlna_profiles(),
        }
    }
}

/// Maps a content type (and optionally codecs) to a DLNA profile name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlnaProfileRule {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    /// Require the primary stream to carry no video codec at all.
    #[serde(default)]
    pub audio_only: bool,
    pub profile: String,
}

impl DlnaProfileRule {
    fn new(content_type: &str, profile: &str) -> Self {
        Self {
            content_type: content_type.into(),
            video_codec: None,
            audio_codec: None,
            audio_only: false,
            profile: profile.into(),
        }
    }

    /// Codec constraints compare case-insensitively; unset constraints match
    /// anything.
    pub fn matches(
        &self,
        content_type: &str,
        video_codec: Option<&str>,
        audio_codec: Option<&str>,
    ) -> bool {
        fn codec_matches(want: Option<&str>, have: Option<&str>) -> bool {
            match (want, have) {
                (None, _) => true,
                (Some(w), Some(h)) => w.eq_ignore_ascii_case(h),
                (Some(_), None) => false,
            }
        }

        self.content_type == content_type
            && !(self.audio_only && video_codec.is_some())
            && codec_matches(self.video_codec.as_deref(), video_codec)
            && codec_matches(self.audio_codec.as_deref(), audio_codec)
    }
}

fn default_mimetype_contenttype() -> BTreeMap<String, String> {
    [
        ("application/ogg", "ogg"),
        ("audio/L16", "pcm"),
        ("audio/aiff", "aiff"),
        ("audio/flac", "flac"),
        ("audio/mp4", "mp4"),
        ("audio/mpeg", "mp3"),
        ("audio/ogg", "ogg"),
        ("audio/vnd.wave", "pcm"),
        ("audio/wav", "pcm"),
        ("audio/wave", "pcm"),
        ("audio/x-aiff", "aiff"),
        ("audio/x-flac", "flac"),
        ("audio/x-matroska", "mka"),
        ("audio/x-mpegurl", "playlist"),
        ("audio/x-ms-wma", "wma"),
        ("audio/x-scpls", "playlist"),
        ("audio/x-wav", "pcm"),
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("video/mp4", "mp4"),
        ("video/mpeg", "mpeg"),
        ("video/x-matroska", "mkv"),
        ("video/x-msvideo", "avi"),
        ("video/x-ms-asf", "asf"),
    ]
    .into_iter()
    .map(|(m, c)| (m.to_string(), c.to_string()))
    .collect()
}

fn default_dlna_profiles() -> Vec<DlnaProfileRule> {
    vec![
        DlnaProfileRule {
            audio_codec: Some("aac".into()),
            audio_only: true,
            ..DlnaProfileRule::new("mp4", "AAC_ISO")
        },
        DlnaProfileRule::new("mp4", "AVC_MP4_EU"),
        DlnaProfileRule::new("mkv", "MKV"),
        DlnaProfileRule::new("avi", "AVI"),
        DlnaProfileRule::new("mpeg", "MPEG_PS_PAL"),
        DlnaProfileRule::new("asf", "VC_ASF_AP_L2_WMA"),
        DlnaProfileRule::new("mp3", "MP3"),
        DlnaProfileRule::new("pcm", "LPCM"),
        DlnaProfileRule::new("wma", "WMABASE"),
        DlnaProfileRule::new("jpg", "JPEG_LRG"),
        DlnaProfileRule::new("png", "PNG_LRG"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.check().is_ok());
        assert!(cfg.extend_protocol_info());
        assert!(cfg.chunked_transfer());
        assert_eq!(cfg.termination_grace(), Duration::from_secs(2));
        assert_eq!(cfg.content_type_for("audio/L16"), Some(CONTENT_TYPE_PCM));
    }

    #[test]
    fn profile_lookup_is_exact() {
        let mut cfg = Config::default();
        cfg.transcoding
            .profiles
            .push(TranscodingProfile::new("mp3-lame", "audio/mpeg", "lame"));
        assert!(cfg.transcoding_profile("mp3-lame").is_some());
        assert!(cfg.transcoding_profile("mp3").is_none());
        assert!(cfg.transcoding_profile("MP3-LAME").is_none());
    }

    #[test]
    fn disabled_transcoding_hides_profiles() {
        let mut cfg = Config::default();
        cfg.transcoding.enabled = false;
        cfg.transcoding
            .profiles
            .push(TranscodingProfile::new("ogg", "audio/ogg", "oggenc"));
        assert!(cfg.transcoding_profile("ogg").is_none());
        assert_eq!(cfg.validate().len(), 2);
    }

    #[test]
    fn duplicate_profiles_rejected() {
        let mut cfg = Config::default();
        cfg.transcoding.profiles = vec![
            TranscodingProfile::new("a", "audio/mpeg", "lame"),
            TranscodingProfile::new("a", "audio/ogg", "oggenc"),
        ];
        assert_matches!(cfg.check(), Err(Error::Config(msg)) if msg.contains("duplicate"));
    }

    #[test]
    fn empty_command_rejected() {
        let mut cfg = Config::default();
        cfg.transcoding.profiles = vec![TranscodingProfile::new("a", "audio/mpeg", " ")];
        assert_matches!(cfg.check(), Err(Error::Config(_)));
    }

    #[test]
    fn dlna_profile_rules() {
        let cfg = Config::default();
        assert_eq!(cfg.dlna_profile("mp3", None, Some("mp3")), Some("MP3"));
        assert_eq!(cfg.dlna_profile("mp4", None, Some("AAC")), Some("AAC_ISO"));
        assert_eq!(
            cfg.dlna_profile("mp4", Some("h264"), Some("aac")),
            Some("AVC_MP4_EU")
        );
        assert_eq!(cfg.dlna_profile("flac", None, None), None);
    }

    #[test]
    fn chunked_override() {
        let mut profile = TranscodingProfile::new("a", "audio/L16", "sox");
        assert!(profile.is_chunked(true));
        profile.chunked = Some(false);
        assert!(!profile.is_chunked(true));
    }

    #[test]
    fn deserialize_partial_profile() {
        let json = r#"{
            "transcoding": {
                "profiles": [
                    {"name": "pcm", "mime_type": "audio/L16", "command": "ffmpeg",
                     "args": ["-i", "{input}", "-f", "s16be", "-"], "stderr": "discard"}
                ]
            }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        let profile = cfg.transcoding_profile("pcm").unwrap();
        assert_eq!(profile.stderr, StderrMode::Discard);
        assert_eq!(profile.args.len(), 5);
        assert!(cfg.transcoding.chunked_transfer);
        assert!(!cfg.mappings.mimetype_contenttype.is_empty());
    }
}
