//! Content repository interface and an in-memory catalogue.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use mediagate_core::{ContentObject, Error, ObjectId, Result};
use parking_lot::RwLock;

/// Read-only lookups the request pipeline performs against the content
/// store.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fails with [`Error::ObjectNotFound`] when no object has this id.
    async fn get_object(&self, id: ObjectId) -> Result<Arc<ContentObject>>;
}

/// Catalogue held in memory, e.g. loaded from a JSON file.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    objects: RwLock<HashMap<ObjectId, Arc<ContentObject>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: impl IntoIterator<Item = ContentObject>) -> Self {
        let repo = Self::new();
        for obj in objects {
            repo.insert(obj);
        }
        repo
    }

    /// Parse a JSON array of content objects.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let objects: Vec<ContentObject> = serde_json::from_str(json)?;
        Ok(Self::from_objects(objects))
    }

    /// Load a JSON catalogue file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalogue: {:?}", path))?;
        let repo = Self::from_json(&content)
            .with_context(|| format!("Failed to parse catalogue: {:?}", path))?;
        tracing::debug!(objects = repo.len(), "catalogue loaded from {:?}", path);
        Ok(repo)
    }

    /// Insert or replace an object.
    pub fn insert(&self, object: ContentObject) -> Option<Arc<ContentObject>> {
        self.objects.write().insert(object.id, Arc::new(object))
    }

    pub fn remove(&self, id: ObjectId) -> Option<Arc<ContentObject>> {
        self.objects.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn get_object(&self, id: ObjectId) -> Result<Arc<ContentObject>> {
        self.objects
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::object_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn lookup_and_missing() {
        let repo = InMemoryRepository::from_objects([
            ContentObject::container(0u64, "Root"),
            ContentObject::item(1u64, "Song", "/music/song.mp3", "audio/mpeg"),
        ]);
        assert_eq!(repo.len(), 2);
        assert!(repo.get_object(ObjectId::new(1)).await.unwrap().is_item());
        assert_matches!(
            repo.get_object(ObjectId::new(99)).await,
            Err(Error::ObjectNotFound { id }) if id == "99"
        );
    }

    #[test]
    fn loads_json_catalogue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 0, "title": "Root", "kind": "container"},
                {"id": 4, "title": "Clip", "kind": "item", "location": "/v/clip.mp4",
                 "mime_type": "video/mp4", "resources": [{"attributes": {"videoCodec": "h264"}}]}
            ]"#,
        )
        .unwrap();
        let repo = InMemoryRepository::load(&path).unwrap();
        assert_eq!(repo.len(), 2);
        assert!(repo.remove(ObjectId::new(4)).is_some());
        assert!(!repo.is_empty());
    }

    #[test]
    fn bad_catalogue_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = InMemoryRepository::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse catalogue"));
    }
}
