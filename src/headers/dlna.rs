//! DLNA header values.

use std::fmt;

use mediagate_core::{attr, ConfigProvider, Resource};

pub const CONTENT_FEATURES_HEADER: &str = "contentFeatures.dlna.org";
pub const TRANSFER_MODE_HEADER: &str = "transferMode.dlna.org";

pub const TRANSFER_MODE_STREAMING: &str = "Streaming";
pub const TRANSFER_MODE_INTERACTIVE: &str = "Interactive";

/// The 32-bit `DLNA.ORG_FLAGS` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlnaFlags(u32);

impl DlnaFlags {
    pub const SENDER_PACED: Self = Self(1 << 31);
    pub const TIME_BASED_SEEK: Self = Self(1 << 30);
    pub const BYTE_BASED_SEEK: Self = Self(1 << 29);
    pub const PLAY_CONTAINER: Self = Self(1 << 28);
    pub const S0_INCREASE: Self = Self(1 << 27);
    pub const SN_INCREASE: Self = Self(1 << 26);
    pub const RTSP_PAUSE: Self = Self(1 << 25);
    pub const STREAMING_TRANSFER_MODE: Self = Self(1 << 24);
    pub const INTERACTIVE_TRANSFER_MODE: Self = Self(1 << 23);
    pub const BACKGROUND_TRANSFER_MODE: Self = Self(1 << 22);
    pub const CONNECTION_STALL: Self = Self(1 << 21);
    pub const DLNA_V15: Self = Self(1 << 20);

    /// Audio and video.
    pub const STREAMING: Self = Self(
        Self::STREAMING_TRANSFER_MODE.0
            | Self::BACKGROUND_TRANSFER_MODE.0
            | Self::CONNECTION_STALL.0
            | Self::DLNA_V15.0,
    );
    /// Images.
    pub const INTERACTIVE: Self = Self(
        Self::INTERACTIVE_TRANSFER_MODE.0 | Self::BACKGROUND_TRANSFER_MODE.0 | Self::DLNA_V15.0,
    );

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for DlnaFlags {
    /// Eight upper-case hex digits followed by the 24 reserved zeros.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}{:024}", self.0, 0)
    }
}

/// Whether the bytes are the stored media or transcoder output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    Direct,
    Transcoded,
}

fn has_major_type(mime: &str, major: &str) -> bool {
    mime.split_once('/')
        .is_some_and(|(m, _)| m.trim().eq_ignore_ascii_case(major))
}

/// MIME type field of a `protocol:network:mime:extra` string.
pub fn mime_from_protocol_info(protocol_info: &str) -> Option<&str> {
    protocol_info
        .split(':')
        .nth(2)
        .map(str::trim)
        .filter(|m| !m.is_empty() && *m != "*")
}

/// `contentFeatures.dlna.org` value for bytes of MIME type `mime`.
///
/// The profile (`DLNA.ORG_PN`) comes from the content-type mapping of `mime`
/// plus the codecs of the primary resource, and is left out when no rule
/// matches. Transcoder output is neither seekable nor the original, so it is
/// announced with `OP=00;CI=1` and matched without source codecs.
///
/// Returns `None` when DLNA header extension is switched off.
pub fn content_features(
    config: &dyn ConfigProvider,
    mime: &str,
    primary: Option<&Resource>,
    source: FeatureSource,
) -> Option<String> {
    if !config.extend_protocol_info() {
        return None;
    }

    let (video_codec, audio_codec) = match (source, primary) {
        (FeatureSource::Direct, Some(res)) => (
            res.attribute(attr::VIDEO_CODEC),
            res.attribute(attr::AUDIO_CODEC),
        ),
        _ => (None, None),
    };
    let profile = config
        .content_type_for(mime)
        .and_then(|ct| config.dlna_profile(ct, video_codec, audio_codec));

    let flags = if has_major_type(mime, "image") {
        DlnaFlags::INTERACTIVE
    } else {
        DlnaFlags::STREAMING
    };
    let (op, ci) = match source {
        FeatureSource::Direct => ("01", "0"),
        FeatureSource::Transcoded => ("00", "1"),
    };

    let mut value = String::new();
    if let Some(pn) = profile {
        value.push_str(&format!("DLNA.ORG_PN={pn};"));
    }
    value.push_str(&format!(
        "DLNA.ORG_OP={op};DLNA.ORG_CI={ci};DLNA.ORG_FLAGS={flags}"
    ));
    Some(value)
}

/// `transferMode.dlna.org` value for a content type, if it has one.
pub fn transfer_mode(config: &dyn ConfigProvider, content_type: &str) -> Option<&'static str> {
    if !config.extend_protocol_info() {
        return None;
    }
    if has_major_type(content_type, "image") {
        Some(TRANSFER_MODE_INTERACTIVE)
    } else if has_major_type(content_type, "audio") || has_major_type(content_type, "video") {
        Some(TRANSFER_MODE_STREAMING)
    } else {
        None
    }
}
