//! Model identifiers: grammar, catalog matching, and resolution.

pub mod catalog;
pub mod geography;
pub mod profile_id;
pub mod provider_key;
pub mod resolver;

pub use catalog::Catalog;
pub use geography::Geography;
pub use profile_id::{
    extract_model_slug, is_full_identifier, parse_identifier, to_friendly_name, ParsedIdentifier,
};
pub use provider_key::{provider_display_name, qualify_model_name, ProviderKey};
pub use resolver::ModelResolver;
