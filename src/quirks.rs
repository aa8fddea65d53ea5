//! Per-client header adjustments.
//!
//! Detection is pluggable through [`QuirksResolver`]; the request pipeline
//! only asks the resolved [`Quirks`] to adjust the headers it built.

use std::net::IpAddr;
use std::sync::Arc;

use mediagate_core::{ContentObject, HandlerType};

use crate::headers::HeaderSet;
use crate::request::RequestUrl;

/// Header some TVs read to find an external subtitle.
pub const CAPTION_INFO_HEADER: &str = "CaptionInfo.sec";

/// Who is asking.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub address: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(address: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self {
            address,
            user_agent,
        }
    }

    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            address: None,
            user_agent: Some(user_agent.into()),
        }
    }
}

/// Header adjustments for one client.
pub trait Quirks: Send + Sync {
    /// Add caption headers for `item` if the client wants them.
    fn add_caption_info(&self, item: &ContentObject, headers: &mut HeaderSet);
}

/// Maps a client to its quirks.
pub trait QuirksResolver: Send + Sync {
    fn resolve(&self, client: &ClientInfo) -> Arc<dyn Quirks>;
}

/// No adjustments for anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQuirks;

impl Quirks for NoQuirks {
    fn add_caption_info(&self, _item: &ContentObject, _headers: &mut HeaderSet) {}
}

impl QuirksResolver for NoQuirks {
    fn resolve(&self, _client: &ClientInfo) -> Arc<dyn Quirks> {
        Arc::new(NoQuirks)
    }
}

/// Quirk switches resolved for a client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientQuirks {
    pub caption_info: bool,
}

impl Quirks for ClientQuirks {
    fn add_caption_info(&self, item: &ContentObject, headers: &mut HeaderSet) {
        if !self.caption_info {
            return;
        }
        let subtitle = item.resources().iter().find_map(|res| {
            (res.handler_type == HandlerType::Subtitle)
                .then(|| res.resource_file().map(|path| (res.index, path)))
                .flatten()
        });
        let Some((index, path)) = subtitle else {
            return;
        };
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "srt".to_string());
        let url = RequestUrl::new(item.id)
            .resource(index, HandlerType::Subtitle)
            .ext(format!("file.{ext}"));
        headers.insert(CAPTION_INFO_HEADER, url.to_string());
    }
}

/// Matches user-agent substrings (case-insensitive) to decide which clients
/// get caption headers.
#[derive(Debug, Clone)]
pub struct UserAgentQuirks {
    caption_agents: Vec<String>,
}

impl UserAgentQuirks {
    pub fn new(caption_agents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            caption_agents: caption_agents
                .into_iter()
                .map(|a| a.into().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Default for UserAgentQuirks {
    fn default() -> Self {
        Self::new(["SEC_HHP", "Samsung"])
    }
}

impl QuirksResolver for UserAgentQuirks {
    fn resolve(&self, client: &ClientInfo) -> Arc<dyn Quirks> {
        let agent = client
            .user_agent
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let caption_info = !agent.is_empty()
            && self.caption_agents.iter().any(|a| agent.contains(a.as_str()));
        Arc::new(ClientQuirks { caption_info })
    }
}
