//! Resource definitions module.
//!
//! Each resource is defined in its own file with its URI, metadata and
//! content provider.

mod mood_table;
mod server_info;

pub use mood_table::{MoodProfileTemplate, MoodTableResource};
pub use server_info::ServerInfoResource;

use super::service::ResourceKind;

/// Trait for resource definitions.
pub trait ResourceDefinition {
    /// The unique URI of the resource.
    const URI: &'static str;

    const NAME: &'static str;

    const DESCRIPTION: &'static str;

    /// The MIME type of the resource content.
    const MIME_TYPE: &'static str;

    /// Resolver for this resource's content.
    const KIND: ResourceKind;
}
