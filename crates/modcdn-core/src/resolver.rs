//! Resolve (module, version, environment) to a CDN descriptor.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{self, CdnError};
use crate::range::parse_version;
use crate::registry::{AssetPath, Registry, VERSION_PLACEHOLDER};
use crate::url::UrlBuilder;

/// Deployment mode: unminified development files or minified production ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CdnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(CdnError::InvalidEnvironment(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub environment: Environment,
}

impl ResolveOptions {
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
        }
    }
}

impl From<Environment> for ResolveOptions {
    fn from(environment: Environment) -> Self {
        Self { environment }
    }
}

/// Where to fetch a module from and which global it exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnDescriptor {
    /// Package name (import sub-paths stripped).
    pub name: String,
    #[serde(rename = "var", skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    pub url: String,
    pub version: String,
    /// Package-relative path; only set when the URL came from the URL builder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_url: Option<String>,
}

impl CdnDescriptor {
    /// `<project_root>/node_modules/<name><path>` if that file is installed.
    pub fn local_path(&self, project_root: &Path) -> Option<PathBuf> {
        let path = self.path.as_deref()?;
        let mut local = project_root.join("node_modules");
        for segment in self.name.split('/').chain(path.split('/')) {
            if !segment.is_empty() {
                local.push(segment);
            }
        }
        local.is_file().then_some(local)
    }
}

/// Resolver over an immutable registry and a URL builder.
///
/// Cheap to clone; clones share the registry and the URL template.
#[derive(Clone, Debug)]
pub struct Resolver {
    registry: Arc<Registry>,
    urls: UrlBuilder,
}

impl Resolver {
    pub fn new(registry: Registry) -> Self {
        Self::with_url_builder(registry, UrlBuilder::new())
    }

    pub fn with_url_builder(registry: Registry, urls: UrlBuilder) -> Self {
        Self {
            registry: Arc::new(registry),
            urls,
        }
    }

    /// Resolver over the registry bundled with the library.
    pub fn builtin() -> error::Result<Self> {
        Ok(Self::new(Registry::builtin()?))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn url_builder(&self) -> &UrlBuilder {
        &self.urls
    }

    /// Resolve a module version to its CDN descriptor.
    ///
    /// `Ok(None)` when the module is not tracked or no range matches the
    /// version (including versions that are not valid semver). Empty
    /// arguments are caller bugs and return `CdnError::InvalidArgument`.
    /// Ranges are tried in registry order and the first match wins.
    pub fn resolve(
        &self,
        module_name: &str,
        version: &str,
        options: &ResolveOptions,
    ) -> error::Result<Option<CdnDescriptor>> {
        if module_name.trim().is_empty() {
            return Err(CdnError::invalid_argument(
                "module_name",
                "expected a non-empty module name",
            ));
        }
        if version.trim().is_empty() {
            return Err(CdnError::invalid_argument(
                "version",
                "expected a non-empty version",
            ));
        }
        let version = version.trim();

        let Some(module) = self.registry.get(module_name) else {
            log::debug!("{} is not tracked", module_name);
            return Ok(None);
        };
        let Some(parsed) = parse_version(version) else {
            log::debug!("{}: '{}' is not a semver version", module_name, version);
            return Ok(None);
        };
        let Some(entry) = module.find_entry(&parsed) else {
            log::debug!("{}@{}: no tracked range matches", module_name, version);
            return Ok(None);
        };

        let name = module.package_name();
        let (url, path) = self.materialize(name, version, entry.path_for(options.environment));
        let (style_url, style_path) = match &entry.style {
            Some(style) => {
                let (url, path) = self.materialize(name, version, style);
                (Some(url), path)
            }
            None => (None, None),
        };

        Ok(Some(CdnDescriptor {
            name: name.to_string(),
            variable_name: entry
                .global_variable
                .clone()
                .or_else(|| module.global_variable.clone()),
            url,
            version: version.to_string(),
            path,
            style_path,
            style_url,
        }))
    }

    /// URL for an asset plus the package path it came from, if any.
    fn materialize(&self, name: &str, version: &str, asset: &AssetPath) -> (String, Option<String>) {
        match asset {
            AssetPath::Local(path) => (self.urls.build(name, version, path), Some(path.clone())),
            AssetPath::RemoteTemplate(template) => {
                (template.replace(VERSION_PLACEHOLDER, version), None)
            }
        }
    }
}
