//! Source adapters.
//!
//! Both produce the raw [`crate::manifest::AppManifest`] shape: `file` by
//! decoding manifest documents, `live` by assembling one from control-plane
//! resources. Neither applies defaults or validation.
pub mod file;
pub mod live;
