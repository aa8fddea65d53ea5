//! Content object resolution and resource location.

use std::sync::Arc;

use mediagate_core::{ContentObject, Error, Resource, Result};

use super::params::RequestParameters;
use crate::repository::ContentRepository;

/// Single repository lookup for the requested object.
pub async fn resolve_object(
    repository: &dyn ContentRepository,
    params: &RequestParameters,
) -> Result<Arc<ContentObject>> {
    repository.get_object(params.object_id).await
}

/// Find the resource a request addresses.
///
/// With a resource handler the index is mandatory and must be in bounds.
/// Without one, the explicit index (or 0) picks the "current" resource used
/// for attribute lookups; objects without resources yield `None`.
///
/// Never touches the filesystem.
pub fn locate_resource<'o>(
    params: &RequestParameters,
    object: &'o ContentObject,
) -> Result<Option<&'o Resource>> {
    let count = object.resource_count();

    if let Some(handler) = params.resource_handler {
        let Some(index) = params.resource_index else {
            return Err(Error::resource_not_found(
                object.id,
                format!("handler {handler} given without a resource index"),
            ));
        };
        return object.resource(index).map(Some).ok_or_else(|| {
            Error::resource_not_found(
                object.id,
                format!("index {index} out of range ({count} resources)"),
            )
        });
    }

    match params.resource_index {
        Some(index) => object.resource(index).map(Some).ok_or_else(|| {
            Error::resource_not_found(
                object.id,
                format!("index {index} out of range ({count} resources)"),
            )
        }),
        None => Ok(object.primary_resource()),
    }
}
