//! Core library for modcdn: module registry, npm range matching, CDN URL resolution.
//! Used by the CLI binary; can be reused by bundler plugins or dev servers.

pub mod config;
pub mod error;
pub mod logging;
pub mod range;
pub mod registry;
pub mod resolver;
pub mod url;


// Re-export main API for CLI
pub use config::{load_config, Config};
pub use error::CdnError;
pub use range::{satisfies, RangeSet};
pub use registry::{package_name, AssetPath, ModuleConfig, Registry, VersionEntry};
pub use resolver::{CdnDescriptor, Environment, ResolveOptions, Resolver};
pub use url::{unpkg_url, UrlBuilder, UrlTemplate, DEFAULT_CDN_BASE};
