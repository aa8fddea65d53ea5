//! Request path parsing.
//!
//! A request path looks like
//! `/content/media/object_id/42/res_id/1/rh/10/ext/file.srt`: an optional
//! `/content/media` prefix, then `/`-separated key/value pairs. An optional
//! query string is merged on top and wins over the path.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use mediagate_core::{ByteRange, Error, HandlerType, ObjectId, Result};

/// Prefix of file request paths.
pub const CONTENT_MEDIA_PREFIX: &str = "/content/media";

pub const KEY_OBJECT_ID: &str = "object_id";
pub const KEY_RESOURCE_ID: &str = "res_id";
pub const KEY_RESOURCE_HANDLER: &str = "rh";
pub const KEY_PROFILE: &str = "pr_name";
pub const KEY_RANGE: &str = "range";
pub const KEY_EXT: &str = "ext";

/// `res_id` value meaning "no explicit resource index".
pub const NO_RESOURCE_ID: &str = "none";

/// Parameters of one file request, derived once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameters {
    pub object_id: ObjectId,
    pub resource_handler: Option<HandlerType>,
    /// `None` when no explicit index was given.
    pub resource_index: Option<usize>,
    pub transcode_profile: Option<String>,
    pub range: Option<ByteRange>,
    raw: BTreeMap<String, String>,
}

impl RequestParameters {
    /// Parse a request path. Pure: no filesystem or network access.
    pub fn parse(path: &str) -> Result<Self> {
        let raw = parse_pairs(path)?;

        let object_id = raw
            .get(KEY_OBJECT_ID)
            .ok_or_else(|| Error::parameter("object_id is missing"))?
            .parse::<ObjectId>()?;

        let resource_handler = raw
            .get(KEY_RESOURCE_HANDLER)
            .map(|h| h.parse::<HandlerType>())
            .transpose()?;

        let resource_index = match raw.get(KEY_RESOURCE_ID).map(String::as_str) {
            None | Some(NO_RESOURCE_ID) => None,
            Some(idx) => Some(idx.parse::<usize>().map_err(|_| {
                Error::parameter(format!("res_id must be a non-negative integer, got '{idx}'"))
            })?),
        };

        let range = raw
            .get(KEY_RANGE)
            .map(|r| r.parse::<ByteRange>())
            .transpose()?;

        Ok(Self {
            object_id,
            resource_handler,
            resource_index,
            transcode_profile: raw.get(KEY_PROFILE).cloned(),
            range,
            raw,
        })
    }

    /// Raw decoded value of any key, including ones the pipeline ignores.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    pub fn raw(&self) -> &BTreeMap<String, String> {
        &self.raw
    }
}

impl FromStr for RequestParameters {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn decode(s: &str) -> Result<String> {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .map_err(|_| Error::parameter(format!("'{s}' is not valid percent-encoded UTF-8")))
}

fn insert_unique(map: &mut BTreeMap<String, String>, key: String, value: String) -> Result<()> {
    if key.is_empty() {
        return Err(Error::parameter("empty parameter name"));
    }
    if map.contains_key(&key) {
        return Err(Error::parameter(format!("duplicate parameter '{key}'")));
    }
    map.insert(key, value);
    Ok(())
}

/// Split path pairs and query pairs, then merge. Empty values are dropped
/// so they read as absent.
fn parse_pairs(path: &str) -> Result<BTreeMap<String, String>> {
    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };

    let path = path.strip_prefix(CONTENT_MEDIA_PREFIX).unwrap_or(path);
    let trimmed = path.trim_matches('/');

    let mut from_path = BTreeMap::new();
    if !trimmed.is_empty() {
        let segments: Vec<&str> = trimmed.split('/').collect();
        for pair in segments.chunks(2) {
            let key = decode(pair[0])?;
            let Some(value) = pair.get(1) else {
                return Err(Error::parameter(format!("parameter '{key}' has no value")));
            };
            insert_unique(&mut from_path, key, decode(value)?)?;
        }
    }

    let mut from_query = BTreeMap::new();
    for part in query.into_iter().flat_map(|q| q.split('&')) {
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once('=') else {
            return Err(Error::parameter(format!(
                "parameter '{}' has no value",
                decode(part)?
            )));
        };
        insert_unique(&mut from_query, decode(key)?, decode(value)?)?;
    }

    from_path.extend(from_query);
    from_path.retain(|_, v| !v.is_empty());
    Ok(from_path)
}

/// Builds request paths in the format [`RequestParameters::parse`] reads.
#[derive(Debug, Clone)]
pub struct RequestUrl {
    object_id: ObjectId,
    resource_index: Option<usize>,
    handler: Option<HandlerType>,
    profile: Option<String>,
    ext: Option<String>,
}

impl RequestUrl {
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            resource_index: None,
            handler: None,
            profile: None,
            ext: None,
        }
    }

    pub fn resource(mut self, index: usize, handler: HandlerType) -> Self {
        self.resource_index = Some(index);
        self.handler = Some(handler);
        self
    }

    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.profile = Some(name.into());
        self
    }

    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }
}

impl fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CONTENT_MEDIA_PREFIX}/{KEY_OBJECT_ID}/{}", self.object_id)?;
        match self.resource_index {
            Some(idx) => write!(f, "/{KEY_RESOURCE_ID}/{idx}")?,
            None => write!(f, "/{KEY_RESOURCE_ID}/{NO_RESOURCE_ID}")?,
        }
        if let Some(handler) = self.handler {
            write!(f, "/{KEY_RESOURCE_HANDLER}/{}", handler.id())?;
        }
        if let Some(profile) = &self.profile {
            write!(f, "/{KEY_PROFILE}/{}", urlencoding::encode(profile))?;
        }
        if let Some(ext) = &self.ext {
            write!(f, "/{KEY_EXT}/{}", urlencoding::encode(ext))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_full_path() {
        let p = RequestParameters::parse(
            "/content/media/object_id/42/res_id/1/rh/10/pr_name/mp3%20low/range/0-99/ext/file.srt",
        )
        .unwrap();
        assert_eq!(p.object_id, ObjectId::new(42));
        assert_eq!(p.resource_index, Some(1));
        assert_eq!(p.resource_handler, Some(HandlerType::Subtitle));
        assert_eq!(p.transcode_profile.as_deref(), Some("mp3 low"));
        assert_eq!(p.range, Some(ByteRange { start: 0, end: Some(99) }));
        assert_eq!(p.get(KEY_EXT), Some("file.srt"));
    }

    #[test]
    fn optional_keys_default_to_absent() {
        let p = RequestParameters::parse("object_id/7").unwrap();
        assert_eq!(p.resource_index, None);
        assert_eq!(p.resource_handler, None);
        assert_eq!(p.transcode_profile, None);
        assert_eq!(p.range, None);
    }

    #[test]
    fn none_sentinel_and_empty_values() {
        let p = RequestParameters::parse("/content/media/object_id/7/res_id/none/pr_name//ext/x")
            .unwrap();
        assert_eq!(p.resource_index, None);
        assert_eq!(p.transcode_profile, None);
    }

    #[test]
    fn query_wins_over_path() {
        let p = RequestParameters::parse("/content/media/object_id/7/pr_name/a?pr_name=b&range=5-")
            .unwrap();
        assert_eq!(p.transcode_profile.as_deref(), Some("b"));
        assert_eq!(p.range, Some(ByteRange { start: 5, end: None }));
    }

    #[test]
    fn malformed_input_is_a_parameter_error() {
        for path in [
            "/content/media/res_id/1",
            "/content/media/object_id/abc",
            "/content/media/object_id/-1",
            "/content/media/object_id/1/res_id/x",
            "/content/media/object_id/1/res_id/-1",
            "/content/media/object_id/1/range/9-3",
            "/content/media/object_id/1/rh",
            "/content/media/object_id/1/object_id/2",
            "/content/media/object_id/1?range",
            "/content/media/object_id/1/rh/bogus",
            "/content/media/object_id/%FF",
        ] {
            assert_matches!(
                RequestParameters::parse(path),
                Err(Error::Parameter(_)),
                "path {path}"
            );
        }
    }

    #[test]
    fn url_builder_round_trips() {
        let url = RequestUrl::new(ObjectId::new(3))
            .resource(2, HandlerType::Subtitle)
            .ext("movie.srt")
            .to_string();
        assert_eq!(url, "/content/media/object_id/3/res_id/2/rh/10/ext/movie.srt");
        let p = RequestParameters::parse(&url).unwrap();
        assert_eq!(p.resource_index, Some(2));
        assert_eq!(p.resource_handler, Some(HandlerType::Subtitle));
    }
}
