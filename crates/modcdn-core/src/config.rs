//! Optional config from .modcdnrc or ~/.modcdnrc (JSON). Merged with env and CLI.

use std::path::{Path, PathBuf};

use crate::error;
use crate::registry::Registry;
use crate::resolver::{Environment, ResolveOptions, Resolver};
use crate::url::{UrlBuilder, UrlTemplate};

pub const CONFIG_FILE_NAME: &str = ".modcdnrc";
pub const ENV_URL_TEMPLATE: &str = "MODCDN_URL_TEMPLATE";
pub const ENV_REGISTRY: &str = "MODCDN_REGISTRY";
pub const ENV_ENVIRONMENT: &str = "MODCDN_ENV";

/// Optional settings. Env and CLI override these.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base URL or `[name]`/`[version]`/`[path]` template for the URL builder.
    pub url_template: Option<String>,
    /// Registry JSON replacing the built-in table.
    pub registry: Option<PathBuf>,
    pub environment: Option<Environment>,
}

impl Config {
    /// Apply `MODCDN_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (process env in production).
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(t) = value(ENV_URL_TEMPLATE) {
            self.url_template = Some(t.trim().to_string());
        }
        if let Some(r) = value(ENV_REGISTRY) {
            self.registry = Some(PathBuf::from(r.trim()));
        }
        if let Some(e) = value(ENV_ENVIRONMENT) {
            match e.parse::<Environment>() {
                Ok(env) => self.environment = Some(env),
                Err(err) => log::warn!("Ignoring {}: {}", ENV_ENVIRONMENT, err),
            }
        }
        self
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            environment: self.environment.unwrap_or_default(),
        }
    }

    /// Build a resolver from the effective settings. Registry and template
    /// errors surface here rather than at resolution time.
    pub fn build_resolver(&self) -> error::Result<Resolver> {
        let registry = match &self.registry {
            Some(path) => {
                log::debug!("Loading registry from {}", path.display());
                Registry::from_path(path)?
            }
            None => Registry::builtin()?,
        };
        Ok(Resolver::with_url_builder(registry, self.url_builder()?))
    }

    pub fn url_builder(&self) -> error::Result<UrlBuilder> {
        Ok(match &self.url_template {
            Some(t) => UrlBuilder::with_template(UrlTemplate::parse(t)?),
            None => UrlBuilder::new(),
        })
    }
}

/// Load config from .modcdnrc in dir, then ~/.modcdnrc. Missing or invalid file = default.
pub fn load_config(dir: &Path) -> Config {
    let mut candidates = vec![dir.join(CONFIG_FILE_NAME)];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(CONFIG_FILE_NAME));
    }
    read_first_config(&candidates)
}

/// Read the first existing file among `candidates`; later ones are not merged.
pub fn read_first_config(candidates: &[PathBuf]) -> Config {
    let mut cfg = Config::default();
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        let Ok(s) = std::fs::read_to_string(path) else {
            log::warn!("Could not read {}", path.display());
            break;
        };
        let v = match serde_json::from_str::<serde_json::Value>(&s) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                break;
            }
        };
        if let Some(t) = v.get("urlTemplate").and_then(|x| x.as_str()) {
            cfg.url_template = Some(t.to_string());
        }
        if let Some(r) = v.get("registry").and_then(|x| x.as_str()) {
            // Relative registry paths are relative to the config file.
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            cfg.registry = Some(base.join(r));
        }
        if let Some(e) = v.get("env").and_then(|x| x.as_str()) {
            cfg.environment = e.parse().ok();
        }
        log::debug!("Loaded config from {}", path.display());
        break;
    }
    cfg
}
