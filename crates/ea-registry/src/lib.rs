//! ea-registry — adapter image tag listing and ordering.
//!
//! Tags come from a [`TagSource`] (the `skopeo` CLI in production) and are
//! returned newest-looking first. When a caller does not pick a tag, the
//! first element of that order is the default.

pub mod error;
pub mod order;
pub mod resolver;
pub mod source;

pub use error::{RegistryError, RegistryResult};
pub use order::{order_tags, preview};
pub use resolver::TagResolver;
pub use source::{SkopeoTagSource, StaticTagSource, TagSource, parse_tag_list};
