//! CDN URL builder: `<base>/<name>@<version><path>` by default (unpkg).
//! The active template lives in a shared handle so a mirror or private CDN can
//! be swapped in with `configure`; there is no process-wide template.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{CdnError, Result};

pub const DEFAULT_CDN_BASE: &str = "https://unpkg.com";

const NAME_TOKEN: &str = "[name]";
const VERSION_TOKEN: &str = "[version]";
const PATH_TOKEN: &str = "[path]";

/// URL template with `[name]`, `[version]` and `[path]` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Accepts either a full template (must use all three placeholders) or a
    /// bare base URL such as `https://cdn.jsdelivr.net/npm`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CdnError::InvalidTemplate {
                template: text.to_string(),
                reason: "template is empty".to_string(),
            });
        }
        let tokens = [NAME_TOKEN, VERSION_TOKEN, PATH_TOKEN];
        if tokens.iter().any(|t| text.contains(t)) {
            if let Some(missing) = tokens.iter().find(|t| !text.contains(*t)) {
                return Err(CdnError::InvalidTemplate {
                    template: text.to_string(),
                    reason: format!("missing {} placeholder", missing),
                });
            }
            return Ok(Self(text.to_string()));
        }
        Ok(Self::from_base(text))
    }

    pub fn from_base(base: &str) -> Self {
        Self(format!(
            "{}/{}@{}{}",
            base.trim().trim_end_matches('/'),
            NAME_TOKEN,
            VERSION_TOKEN,
            PATH_TOKEN
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, name: &str, version: &str, path: &str) -> String {
        self.0
            .replace(NAME_TOKEN, name)
            .replace(VERSION_TOKEN, version)
            .replace(PATH_TOKEN, path)
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        Self::from_base(DEFAULT_CDN_BASE)
    }
}

/// Cloneable handle to the active template. Clones share the template;
/// `configure` is the single writer and affects every build started after it
/// returns.
#[derive(Clone, Debug, Default)]
pub struct UrlBuilder {
    template: Arc<RwLock<UrlTemplate>>,
}

impl UrlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(template: UrlTemplate) -> Self {
        Self {
            template: Arc::new(RwLock::new(template)),
        }
    }

    /// Replace the active template.
    pub fn configure(&self, template: UrlTemplate) {
        // A poisoned lock still holds a whole template value.
        let mut guard = self.template.write().unwrap_or_else(PoisonError::into_inner);
        log::debug!("CDN URL template set to {}", template.as_str());
        *guard = template;
    }

    pub fn template(&self) -> UrlTemplate {
        self.template
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build the CDN URL for a package-relative path (e.g. `/dist/react.js`).
    pub fn build(&self, name: &str, version: &str, path: &str) -> String {
        self.template
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .render(name, version, path)
    }
}

/// Build a URL with the default unpkg template.
pub fn unpkg_url(name: &str, version: &str, path: &str) -> String {
    UrlTemplate::default().render(name, version, path)
}
