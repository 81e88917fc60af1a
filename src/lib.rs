//! Cloud Foundry application discovery.
//!
//! Turns a Cloud Foundry application description, read from a manifest file
//! or assembled from a live v3 control plane, into the platform-neutral
//! [`model::Application`] consumed by downstream artifact generators.
//!
//! The flow is: source adapter -> [`manifest::AppManifest`] ->
//! [`normalize::normalize`] (defaulting, process reconciliation, validation)
//! -> [`redact::Redactor`] -> [`content::DiscoverResult`].
pub mod config;
pub mod content;
pub mod discover;
pub mod error;
pub mod manifest;
pub mod model;
pub mod normalize;
pub mod output;
pub mod redact;
pub mod source;
pub mod util;
pub mod validate;

pub use content::DiscoverResult;
pub use error::DiscoverError;
pub use manifest::AppManifest;
pub use model::Application;
pub use normalize::normalize;
pub use validate::validate;
