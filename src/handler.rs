//! The two entry points the transport layer calls per file request:
//! [`FileRequestHandler::describe`] for response metadata and
//! [`FileRequestHandler::open`] for the bytes.
//!
//! Both run the same resolution path (parse, look up, select mode, check
//! access), so for identical request paths they always agree on the delivery
//! mode.

use std::fs::Metadata;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mediagate_av::{
    augment_pcm_mime, stat_file, DeclaredLength, FileSource, StreamHandle, TranscodeDispatcher,
};
use mediagate_core::{ConfigProvider, ContentObject, OpenMode, Resource, Result};
use serde::{Serialize, Serializer};

use crate::headers::{
    content_features, mime_from_protocol_info, transfer_mode, FeatureSource, HeaderSet,
    CONTENT_FEATURES_HEADER, TRANSFER_MODE_HEADER,
};
use crate::metadata::{HandlerRegistry, MetadataHandler};
use crate::quirks::{ClientInfo, NoQuirks, QuirksResolver};
use crate::repository::ContentRepository;
use crate::request::{resolve_object, select_mode, DeliveryKind, DeliveryMode, RequestParameters};

/// Notified when an item starts playing.
pub trait PlayHook: Send + Sync {
    fn on_play(&self, object: &ContentObject);
}

/// Response metadata for a request.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub delivery: DeliveryKind,
    /// `None` when no MIME type could be determined.
    pub content_type: Option<String>,
    #[serde(serialize_with = "serialize_length")]
    pub length: DeclaredLength,
    pub headers: HeaderSet,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_directory: bool,
    pub readable: bool,
}

fn serialize_length<S: Serializer>(
    length: &DeclaredLength,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match length {
        DeclaredLength::Known(n) => serializer.serialize_u64(*n),
        other => serializer.serialize_str(&other.to_string()),
    }
}

/// Outcome of the shared resolution path.
pub struct Resolution {
    pub params: RequestParameters,
    pub mode: DeliveryMode,
    /// `stat` of the file backing the request, if there is one.
    pub metadata: Option<Metadata>,
    handler: Option<Arc<dyn MetadataHandler>>,
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("params", &self.params)
            .field("mode", &self.mode)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Resolves file requests against a repository and configuration.
#[derive(Clone)]
pub struct FileRequestHandler {
    repository: Arc<dyn ContentRepository>,
    config: Arc<dyn ConfigProvider>,
    handlers: Arc<HandlerRegistry>,
    quirks: Arc<dyn QuirksResolver>,
    dispatcher: TranscodeDispatcher,
    play_hook: Option<Arc<dyn PlayHook>>,
}

impl FileRequestHandler {
    /// Default metadata handlers, no client quirks, no play hook.
    pub fn new(repository: Arc<dyn ContentRepository>, config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            repository,
            dispatcher: TranscodeDispatcher::new(config.clone()),
            config,
            handlers: Arc::new(HandlerRegistry::with_defaults()),
            quirks: Arc::new(NoQuirks),
            play_hook: None,
        }
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn with_quirks(mut self, quirks: Arc<dyn QuirksResolver>) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_play_hook(mut self, hook: Arc<dyn PlayHook>) -> Self {
        self.play_hook = Some(hook);
        self
    }

    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    /// Parse, look up the object, select the delivery mode, and check that
    /// whatever backs it is accessible.
    pub async fn resolve(&self, path: &str) -> Result<Resolution> {
        let params = RequestParameters::parse(path)?;
        let object = resolve_object(self.repository.as_ref(), &params).await?;
        let mode = select_mode(&params, object)?;

        let mut handler = None;
        let metadata = match &mode {
            DeliveryMode::MetadataResource {
                object,
                handler: requested,
                ..
            } => {
                let resource = mode.resource().ok_or_else(|| {
                    mediagate_core::Error::resource_not_found(object.id, "resource vanished")
                })?;
                handler = Some(self.handlers.handler_for(object, *requested, resource)?);
                match resource.resource_file() {
                    Some(side) => Some(stat_file(side, true).await?),
                    None => None,
                }
            }
            DeliveryMode::Transcoded {
                object, profile, ..
            } => {
                self.dispatcher.profile(profile)?;
                Some(stat_file(object.require_item()?, false).await?)
            }
            DeliveryMode::DirectFile {
                path, side_file, ..
            } => Some(stat_file(path, *side_file).await?),
        };

        Ok(Resolution {
            params,
            mode,
            metadata,
            handler,
        })
    }

    /// Response metadata: content type, declared length, and DLNA headers.
    pub async fn describe(&self, path: &str, client: &ClientInfo) -> Result<FileInfo> {
        tracing::debug!(path, "describe: start");
        let resolution = self.resolve(path).await?;
        let config = self.config.as_ref();
        let mut headers = HeaderSet::new();

        let (content_type, length) = match &resolution.mode {
            DeliveryMode::MetadataResource {
                object,
                resource_index,
                ..
            } => {
                let handler = resolution.metadata_handler()?;
                let mut stream = handler.serve_content(object, *resource_index).await?;
                let length = stream.probe_length().await?;
                let content_type = resolution
                    .mode
                    .resource()
                    .and_then(Resource::protocol_info)
                    .and_then(mime_from_protocol_info)
                    .or_else(|| handler.mime_type())
                    .or_else(|| object.mime_type())
                    .map(str::to_owned);
                (content_type, DeclaredLength::Known(length))
            }
            DeliveryMode::Transcoded {
                object, profile, ..
            } => {
                let profile = self.dispatcher.profile(profile)?;
                headers.insert_opt(
                    CONTENT_FEATURES_HEADER,
                    content_features(
                        config,
                        &profile.mime_type,
                        object.primary_resource(),
                        FeatureSource::Transcoded,
                    ),
                );
                (
                    Some(self.dispatcher.content_type(profile, object)),
                    self.dispatcher.declared_length(profile),
                )
            }
            DeliveryMode::DirectFile {
                object,
                path,
                side_file: true,
            } => {
                let length = probe_file(path, true).await?;
                let content_type = resolution
                    .params
                    .resource_index
                    .and_then(|i| object.resource(i))
                    .and_then(Resource::protocol_info)
                    .and_then(mime_from_protocol_info)
                    .map(str::to_owned);
                (content_type, DeclaredLength::Known(length))
            }
            DeliveryMode::DirectFile {
                object,
                path,
                side_file: false,
            } => {
                let length = probe_file(path, false).await?;
                let primary = object.primary_resource();

                let quirks = self.quirks.resolve(client);
                quirks.add_caption_info(object, &mut headers);

                let content_type = object.mime_type().map(|mime| {
                    headers.insert_opt(
                        CONTENT_FEATURES_HEADER,
                        content_features(config, mime, primary, FeatureSource::Direct),
                    );
                    augment_pcm_mime(mime, config, primary)
                });
                (content_type, DeclaredLength::Known(length))
            }
        };

        if let Some(ct) = &content_type {
            headers.insert_opt(TRANSFER_MODE_HEADER, transfer_mode(config, ct));
        }

        let metadata = resolution.metadata.as_ref();
        let info = FileInfo {
            delivery: resolution.mode.kind(),
            content_type,
            length,
            headers,
            last_modified: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
            is_directory: metadata.is_some_and(Metadata::is_dir),
            readable: true,
        };

        tracing::debug!(
            path,
            delivery = %info.delivery,
            handler = ?resolution.params.resource_handler,
            resource_index = ?resolution.params.resource_index,
            content_type = ?info.content_type,
            length = %info.length,
            "describe: end"
        );
        Ok(info)
    }

    /// An open stream over the request's bytes.
    ///
    /// Write mode is rejected before anything else happens, including the
    /// object lookup.
    pub async fn open(&self, path: &str, mode: OpenMode) -> Result<StreamHandle> {
        mode.ensure_read()?;
        tracing::debug!(path, "open: start");
        let resolution = self.resolve(path).await?;

        let handle = match &resolution.mode {
            DeliveryMode::MetadataResource {
                object,
                resource_index,
                ..
            } => {
                let handler = resolution.metadata_handler()?;
                let mut handle = handler.serve_content(object, *resource_index).await?;
                handle.open(OpenMode::Read).await?;
                handle
            }
            DeliveryMode::Transcoded {
                object,
                profile,
                range,
            } => {
                self.notify_play(object);
                self.dispatcher.serve_content(profile, object, *range).await?
            }
            DeliveryMode::DirectFile {
                object,
                path,
                side_file,
            } => {
                self.notify_play(object);
                let source = if *side_file {
                    FileSource::side_file(path)
                } else {
                    FileSource::new(path)
                };
                let mut handle = StreamHandle::new(source);
                handle.open(OpenMode::Read).await?;
                handle
            }
        };

        tracing::debug!(
            path,
            delivery = %resolution.mode.kind(),
            handler = ?resolution.params.resource_handler,
            resource_index = ?resolution.params.resource_index,
            source = %handle.describe(),
            "open: end"
        );
        Ok(handle)
    }

    fn notify_play(&self, object: &ContentObject) {
        if let Some(hook) = &self.play_hook {
            hook.on_play(object);
        }
    }
}

impl Resolution {
    fn metadata_handler(&self) -> Result<&Arc<dyn MetadataHandler>> {
        self.handler.as_ref().ok_or_else(|| {
            mediagate_core::Error::resource_not_found(
                self.mode.object().id,
                "no metadata handler resolved",
            )
        })
    }
}

async fn probe_file(path: &Path, side_file: bool) -> Result<u64> {
    let source = if side_file {
        FileSource::side_file(path)
    } else {
        FileSource::new(path)
    };
    StreamHandle::new(source).probe_length().await
}

impl std::fmt::Debug for FileRequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRequestHandler")
            .field("handlers", &self.handlers)
            .field("play_hook", &self.play_hook.is_some())
            .finish_non_exhaustive()
    }
}
