//! mediagate-core: shared content model, errors, and configuration.
//!
//! This crate is the foundational dependency of the other mediagate crates,
//! providing typed object ids, the content object / resource model, the
//! unified error taxonomy of the file request pipeline, and the configuration
//! data model consumed through [`config::ConfigProvider`].

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

pub use config::{Config, ConfigProvider, TranscodingProfile};
pub use error::{Error, Result};
pub use ids::ObjectId;
pub use media::*;
