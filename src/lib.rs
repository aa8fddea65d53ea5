//! Mediagate - file request pipeline for a DLNA/UPnP media node
//!
//! Decides what bytes to serve for a file request and which protocol headers
//! to attach, then produces the bytes from a file, a metadata handler, or an
//! external transcoder. The transport layer calls
//! [`FileRequestHandler::describe`] and [`FileRequestHandler::open`].

pub mod config;
pub mod handler;
pub mod headers;
pub mod metadata;
pub mod quirks;
pub mod repository;
pub mod request;

pub use handler::{FileInfo, FileRequestHandler, PlayHook, Resolution};
pub use headers::HeaderSet;
pub use quirks::ClientInfo;
pub use repository::{ContentRepository, InMemoryRepository};
