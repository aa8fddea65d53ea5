//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which owns a temporary media directory, an
//! in-memory catalogue, and a configuration, and builds a
//! [`FileRequestHandler`] over them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mediagate::config::{Config, TranscodingProfile};
use mediagate::{FileRequestHandler, InMemoryRepository};
use mediagate_core::{attr, ContentObject, HandlerType, Resource};
use parking_lot::Mutex;

/// Test harness over a temp directory and an in-memory catalogue.
pub struct TestHarness {
    pub dir: tempfile::TempDir,
    pub repo: Arc<InMemoryRepository>,
    pub config: Config,
}

impl TestHarness {
    /// Create a new harness with default configuration and an empty
    /// catalogue.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
            repo: Arc::new(InMemoryRepository::new()),
            config,
        }
    }

    pub fn add_profile(&mut self, profile: TranscodingProfile) {
        self.config.transcoding.profiles.push(profile);
    }

    /// Write a media file of `len` bytes and return its path.
    pub fn media_file(&self, name: &str, len: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, data).expect("failed to write media file");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn insert(&self, object: ContentObject) {
        self.repo.insert(object);
    }

    /// Build a handler over the current catalogue and config.
    pub fn handler(&self) -> FileRequestHandler {
        FileRequestHandler::new(self.repo.clone(), Arc::new(self.config.clone()))
    }
}

/// Item with a primary resource carrying audio attributes.
pub fn audio_item(id: u64, location: &Path, mime: &str) -> ContentObject {
    ContentObject::item(id, "Track", location, mime).with_resource(
        Resource::new(HandlerType::Default)
            .with_attribute(attr::SAMPLE_FREQUENCY, "44100")
            .with_attribute(attr::NR_AUDIO_CHANNELS, "2")
            .with_attribute(attr::AUDIO_CODEC, "mp3"),
    )
}

/// Item with a primary resource and a subtitle side file at `subtitle`.
pub fn movie_with_subtitle(id: u64, location: &Path, subtitle: &Path) -> ContentObject {
    ContentObject::item(id, "Movie", location, "video/x-matroska")
        .with_resource(
            Resource::new(HandlerType::Default)
                .with_attribute(attr::VIDEO_CODEC, "h264")
                .with_attribute(attr::AUDIO_CODEC, "aac"),
        )
        .with_resource(
            Resource::new(HandlerType::Subtitle)
                .with_attribute(attr::RESOURCE_FILE, subtitle.to_string_lossy())
                .with_attribute(attr::PROTOCOL_INFO, "http-get:*:text/srt:*"),
        )
}

/// Records every object a play hook was called for.
#[derive(Default)]
pub struct RecordingPlayHook {
    pub played: Mutex<Vec<u64>>,
}

impl mediagate::PlayHook for RecordingPlayHook {
    fn on_play(&self, object: &ContentObject) {
        self.played.lock().push(object.id.get());
    }
}

/// True while a process with this pid exists, zombies included.
#[cfg(target_os = "linux")]
pub fn process_alive(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}
