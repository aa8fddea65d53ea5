//! # mediagate-av
//!
//! Byte delivery for the mediagate request pipeline.
//!
//! This crate provides:
//!
//! - **Stream handles** ([`StreamHandle`]) -- one open/read/seek/tell/close
//!   contract over files ([`FileSource`]), in-memory handler output
//!   ([`MemorySource`]) and transcoder pipes ([`PipeSource`]).
//! - **Transcode dispatch** ([`TranscodeDispatcher`]) -- exact-name profile
//!   lookup, output MIME type, and process start.
//! - **Command templates** ([`TemplateContext`]) -- `{input}`, `{range}` and
//!   friends in profile arguments.
//! - **Tool lookup** ([`resolve_tool`]) -- find transcoder executables.

pub mod command;
pub mod dispatch;
pub mod stream;
pub mod template;
pub mod tools;

pub use command::TranscodeCommand;
pub use dispatch::{augment_pcm_mime, TranscodeDispatcher};
pub use stream::{
    stat_file, DeclaredLength, FileSource, MemorySource, PipeSource, SourceKind, StreamHandle,
    StreamSource,
};
pub use template::TemplateContext;
pub use tools::{check_tool, resolve_tool, ToolInfo};
