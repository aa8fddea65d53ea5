//! Metadata handlers: producers of resource bytes that are not the item's
//! own media file (side files, artwork, generated content).

mod side_file;
mod static_content;

pub use side_file::SideFileHandler;
pub use static_content::StaticContentHandler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mediagate_av::StreamHandle;
use mediagate_core::{ContentObject, Error, HandlerType, Resource, Result};

/// Produces the bytes of one resource of a content object.
#[async_trait]
pub trait MetadataHandler: Send + Sync {
    /// MIME type of everything this handler serves, if it is fixed.
    fn mime_type(&self) -> Option<&str> {
        None
    }

    /// A closed handle over the resource's bytes.
    async fn serve_content(
        &self,
        object: &ContentObject,
        resource_index: usize,
    ) -> Result<StreamHandle>;
}

/// Handlers keyed by [`HandlerType`].
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerType, Arc<dyn MetadataHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// [`SideFileHandler`] for every handler type whose resources are stored
    /// as files next to the media.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let side: Arc<dyn MetadataHandler> = Arc::new(SideFileHandler);
        for handler_type in [
            HandlerType::Fanart,
            HandlerType::Subtitle,
            HandlerType::ContainerArt,
            HandlerType::Resource,
        ] {
            registry.register(handler_type, side.clone());
        }
        registry
    }

    /// Register (or replace) the handler for a type.
    pub fn register(&mut self, handler_type: HandlerType, handler: Arc<dyn MetadataHandler>) {
        self.handlers.insert(handler_type, handler);
    }

    pub fn create_handler(&self, handler_type: HandlerType) -> Option<Arc<dyn MetadataHandler>> {
        self.handlers.get(&handler_type).cloned()
    }

    pub fn is_registered(&self, handler_type: HandlerType) -> bool {
        self.handlers.contains_key(&handler_type)
    }

    /// Handler for a request naming `requested`, falling back to the
    /// resource's own handler type.
    pub fn handler_for(
        &self,
        object: &ContentObject,
        requested: HandlerType,
        resource: &Resource,
    ) -> Result<Arc<dyn MetadataHandler>> {
        self.create_handler(requested)
            .or_else(|| self.create_handler(resource.handler_type))
            .ok_or_else(|| {
                Error::resource_not_found(
                    object.id,
                    format!(
                        "no metadata handler for '{requested}' or '{}'",
                        resource.handler_type
                    ),
                )
            })
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().map(|h| h.name()).collect();
        types.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // `assert_matches!` formats the scrutinee on failure.
    impl std::fmt::Debug for dyn MetadataHandler {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("dyn MetadataHandler")
        }
    }

    #[test]
    fn defaults_cover_side_file_types() {
        let registry = HandlerRegistry::with_defaults();
        assert!(registry.is_registered(HandlerType::Subtitle));
        assert!(registry.is_registered(HandlerType::Fanart));
        assert!(!registry.is_registered(HandlerType::Id3));
    }

    #[test]
    fn falls_back_to_resource_handler_type() {
        let registry = HandlerRegistry::with_defaults();
        let obj = ContentObject::item(1u64, "Song", "/m/song.mp3", "audio/mpeg");
        let subtitle = Resource::new(HandlerType::Subtitle);
        assert!(registry
            .handler_for(&obj, HandlerType::Id3, &subtitle)
            .is_ok());

        let tagged = Resource::new(HandlerType::Id3);
        assert_matches!(
            registry.handler_for(&obj, HandlerType::Flac, &tagged),
            Err(Error::ResourceNotFound { .. })
        );
    }
}
