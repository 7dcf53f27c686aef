//! Module registry: module name -> global variable and an ordered table of
//! version range -> development/production/style paths.
//!
//! Range order is the order written in the JSON source and it matters:
//! resolution takes the first range that matches, not the most specific one.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use semver::Version;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{self, CdnError};
use crate::range::RangeSet;
use crate::resolver::Environment;

/// Registry shipped with the library.
const BUILTIN_MODULES: &str = include_str!("modules.json");

/// Placeholder replaced by the requested version in remote URL templates.
pub const VERSION_PLACEHOLDER: &str = "[version]";

/// Package name for an import path: `react-dom/server` -> `react-dom`,
/// `@angular/core/testing` -> `@angular/core`.
pub fn package_name(import_path: &str) -> &str {
    let mut segments = import_path.splitn(3, '/');
    let first = segments.next().unwrap_or("");
    if !first.starts_with('@') {
        return first;
    }
    match segments.next() {
        Some(second) => &import_path[..first.len() + 1 + second.len()],
        None => import_path,
    }
}

/// Where an asset lives, decided once when the registry is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetPath {
    /// Package-relative path (`/dist/react.js`), turned into a URL by the
    /// URL builder.
    Local(String),
    /// Absolute URL with a `[version]` placeholder.
    RemoteTemplate(String),
}

impl AssetPath {
    /// `None` when the path follows neither convention.
    pub fn parse(path: &str) -> Option<Self> {
        if path.starts_with('/') {
            Some(AssetPath::Local(path.to_string()))
        } else if path.contains(VERSION_PLACEHOLDER) {
            Some(AssetPath::RemoteTemplate(path.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssetPath::Local(path) | AssetPath::RemoteTemplate(path) => path,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VersionEntry {
    pub range: RangeSet,
    pub development: AssetPath,
    pub production: AssetPath,
    pub style: Option<AssetPath>,
    /// Overrides the module-level global variable for this range.
    pub global_variable: Option<String>,
}

impl VersionEntry {
    pub fn path_for(&self, environment: Environment) -> &AssetPath {
        match environment {
            Environment::Development => &self.development,
            Environment::Production => &self.production,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModuleConfig {
    /// Registry key; may be an import path below the package.
    pub name: String,
    pub global_variable: Option<String>,
    pub versions: Vec<VersionEntry>,
}

impl ModuleConfig {
    pub fn package_name(&self) -> &str {
        package_name(&self.name)
    }

    /// First entry, in declared order, whose range the version satisfies.
    pub fn find_entry(&self, version: &Version) -> Option<&VersionEntry> {
        self.versions.iter().find(|entry| {
            let hit = entry.range.matches(version);
            log::trace!("{} {} vs '{}': {}", self.name, version, entry.range, hit);
            hit
        })
    }

    fn from_raw(name: &str, raw: RawModule) -> error::Result<Self> {
        let mut versions = Vec::with_capacity(raw.versions.0.len());
        for (range_text, entry) in raw.versions.0 {
            let range = RangeSet::parse(&range_text).map_err(|reason| CdnError::InvalidRange {
                module: name.to_string(),
                range: range_text.clone(),
                reason,
            })?;
            let style = match entry.style.as_deref() {
                Some(style) => Some(asset_path(name, &range_text, style)?),
                None => None,
            };
            versions.push(VersionEntry {
                development: asset_path(name, &range_text, &entry.development)?,
                production: asset_path(name, &range_text, &entry.production)?,
                style,
                global_variable: entry.var,
                range,
            });
        }
        Ok(Self {
            name: name.to_string(),
            global_variable: raw.var,
            versions,
        })
    }
}

fn asset_path(module: &str, range: &str, path: &str) -> error::Result<AssetPath> {
    AssetPath::parse(path).ok_or_else(|| CdnError::InvalidPath {
        module: module.to_string(),
        range: range.to_string(),
        path: path.to_string(),
        reason: format!(
            "expected a '/'-prefixed package path or a URL containing {}",
            VERSION_PLACEHOLDER
        ),
    })
}

/// Immutable once loaded; modules are kept in name order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    modules: BTreeMap<String, ModuleConfig>,
}

impl Registry {
    pub fn builtin() -> error::Result<Self> {
        Self::from_json_str(BUILTIN_MODULES)
    }

    /// Parse and validate a registry. Bad ranges and paths fail here, never
    /// during resolution.
    pub fn from_json_str(json: &str) -> error::Result<Self> {
        let raw: BTreeMap<String, RawModule> = serde_json::from_str(json)?;
        let mut modules = BTreeMap::new();
        for (name, module) in raw {
            let config = ModuleConfig::from_raw(&name, module)?;
            modules.insert(name, config);
        }
        log::debug!("Loaded {} module(s) into registry", modules.len());
        Ok(Self { modules })
    }

    pub fn from_path(path: &Path) -> error::Result<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| CdnError::io(path, e))?;
        Self::from_json_str(&s)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleConfig> {
        self.modules.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ---- JSON shape ----

#[derive(Deserialize)]
struct RawModule {
    #[serde(default)]
    var: Option<String>,
    versions: OrderedRanges,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVersionEntry {
    development: String,
    production: String,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    var: Option<String>,
}

/// `versions` object read as a list so source order survives.
struct OrderedRanges(Vec<(String, RawVersionEntry)>);

impl<'de> Deserialize<'de> for OrderedRanges {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedRangesVisitor)
    }
}

struct OrderedRangesVisitor;

impl<'de> Visitor<'de> for OrderedRangesVisitor {
    type Value = OrderedRanges;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of version ranges to path entries")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, RawVersionEntry)> =
            Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((range, entry)) = map.next_entry::<String, RawVersionEntry>()? {
            if entries.iter().any(|(existing, _)| *existing == range) {
                return Err(de::Error::custom(format!("duplicate range '{}'", range)));
            }
            entries.push((range, entry));
        }
        Ok(OrderedRanges(entries))
    }
}
