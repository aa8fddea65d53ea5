//! Request resolution: path parameters, object and resource lookup, and
//! delivery mode selection.

pub mod mode;
pub mod params;
pub mod resolve;

pub use mode::{select_mode, DeliveryKind, DeliveryMode};
pub use params::{RequestParameters, RequestUrl};
pub use resolve::{locate_resource, resolve_object};
