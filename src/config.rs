//! Configuration management for Sweeparr
//!
//! This module handles loading, parsing, and validating the policy document
//! (Sonarr connection, grace periods, per-series overrides) together with
//! environment variable overrides. Hot reloading lives in [`crate::reload`].

use crate::error::{Result, SweeparrError};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

/// Main configuration structure for Sweeparr
///
/// A `Config` is always handled as an immutable snapshot. Reloading builds a
/// fresh value and swaps it in whole; nothing mutates a live snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Sonarr connection settings
    #[serde(default)]
    pub sonarr: Option<SonarrConfig>,

    /// Unmonitor the episode in Sonarr after its file is deleted; an explicit
    /// `null` reads as `false`
    #[serde(
        default = "default_unmonitor_after_delete",
        deserialize_with = "bool_or_null"
    )]
    pub unmonitor_after_delete: bool,

    /// Global grace period in days; `0` deletes as soon as an episode is
    /// watched. Absent means 2 days, an explicit `null` means `None`, which
    /// never deletes.
    #[serde(default = "default_grace_days")]
    pub grace_days: Option<i64>,

    /// Per-series overrides keyed by series title, in document order
    #[serde(default)]
    pub series_settings: SeriesSettingsMap,
}

/// Sonarr connection configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SonarrConfig {
    /// Base URL of the Sonarr instance (e.g. `http://localhost:8989`)
    #[serde(default)]
    pub url: String,

    /// API key sent in the `X-Api-Key` header
    #[serde(default)]
    pub api_key: String,
}

impl SonarrConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Per-series override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSettings {
    /// Grace period for this series; absent means "never delete immediately"
    #[serde(default)]
    pub grace_days: Option<i64>,
}

fn default_unmonitor_after_delete() -> bool {
    true
}

fn default_grace_days() -> Option<i64> {
    Some(2)
}

fn bool_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sonarr: None,
            unmonitor_after_delete: default_unmonitor_after_delete(),
            grace_days: default_grace_days(),
            series_settings: SeriesSettingsMap::default(),
        }
    }
}

/// Series overrides that keep the order in which keys appear in the document.
///
/// Case-insensitive lookups pick the first matching key, so the order is
/// part of the policy and a plain `HashMap` would lose it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSettingsMap {
    entries: Vec<(String, SeriesSettings)>,
}

impl SeriesSettingsMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an override. A repeated key keeps its original position and
    /// takes the new value.
    ///
    /// # Examples
    ///
    /// ```
    /// use sweeparr::config::{SeriesSettings, SeriesSettingsMap};
    ///
    /// let mut map = SeriesSettingsMap::new();
    /// map.insert("B", SeriesSettings { grace_days: Some(1) });
    /// map.insert("A", SeriesSettings { grace_days: None });
    /// map.insert("B", SeriesSettings { grace_days: Some(0) });
    ///
    /// let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
    /// assert_eq!(keys, vec!["B", "A"]);
    /// assert_eq!(map.get("B").unwrap().grace_days, Some(0));
    /// ```
    pub fn insert(&mut self, series: impl Into<String>, settings: SeriesSettings) {
        let series = series.into();
        match self.entries.iter_mut().find(|(key, _)| *key == series) {
            Some(entry) => entry.1 = settings,
            None => self.entries.push((series, settings)),
        }
    }

    /// Exact, case-sensitive lookup
    pub fn get(&self, series: &str) -> Option<&SeriesSettings> {
        self.entries
            .iter()
            .find(|(key, _)| key == series)
            .map(|(_, settings)| settings)
    }

    /// First entry whose key equals `series` ignoring case, in document order
    ///
    /// # Returns
    ///
    /// The matched key as written in the document, with its settings
    pub fn find_case_insensitive(&self, series: &str) -> Option<(&str, &SeriesSettings)> {
        let wanted = series.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(key, settings)| (key.as_str(), settings))
    }

    /// Iterate over entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesSettings)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SeriesSettings)> for SeriesSettingsMap {
    fn from_iter<I: IntoIterator<Item = (K, SeriesSettings)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, settings) in iter {
            map.insert(key, settings);
        }
        map
    }
}

impl Serialize for SeriesSettingsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, settings) in &self.entries {
            map.serialize_entry(key, settings)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeriesSettingsMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SeriesSettingsMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of series title to settings")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut map = SeriesSettingsMap::new();
                while let Some((key, settings)) =
                    access.next_entry::<String, SeriesSettings>()?
                {
                    map.insert(key, settings);
                }
                Ok(map)
            }

            fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(SeriesSettingsMap::new())
            }
        }

        deserializer.deserialize_any(OrderedVisitor)
    }
}

impl Config {
    /// Load the policy document from `path` and apply environment overrides
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML; everything else
    /// is parsed as JSON.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON or YAML policy document
    ///
    /// # Returns
    ///
    /// The parsed configuration with `SWEEPARR_*` overrides applied. The
    /// result is not validated; call [`Config::validate`] for that.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path.as_ref())?;
        config.apply_env_vars();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SweeparrError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        if is_yaml {
            serde_yaml::from_str(&contents).map_err(|e| {
                SweeparrError::Config(format!("Failed to parse {}: {}", path.display(), e)).into()
            })
        } else {
            Self::from_json(&contents).map_err(|e| {
                SweeparrError::Config(format!("Failed to parse {}: {}", path.display(), e)).into()
            })
        }
    }

    /// Parse a JSON policy document without environment overrides
    ///
    /// # Examples
    ///
    /// ```
    /// use sweeparr::config::Config;
    ///
    /// let config = Config::from_json(r#"{"grace_days": 0}"#).unwrap();
    /// assert_eq!(config.grace_days, Some(0));
    /// assert!(config.unmonitor_after_delete);
    ///
    /// let never = Config::from_json(r#"{"grace_days": null}"#).unwrap();
    /// assert_eq!(never.grace_days, None);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or mistyped fields.
    pub fn from_json(contents: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("SWEEPARR_SONARR_URL") {
            self.sonarr.get_or_insert_with(SonarrConfig::default).url = url;
            tracing::debug!("Env override: SWEEPARR_SONARR_URL");
        }

        if let Ok(api_key) = std::env::var("SWEEPARR_SONARR_API_KEY") {
            self.sonarr.get_or_insert_with(SonarrConfig::default).api_key = api_key;
            tracing::debug!("Env override: SWEEPARR_SONARR_API_KEY");
        }

        if let Ok(grace_days) = std::env::var("SWEEPARR_GRACE_DAYS") {
            match grace_days.parse::<i64>() {
                Ok(v) => {
                    self.grace_days = Some(v);
                    tracing::debug!(grace_days = v, "Env override: SWEEPARR_GRACE_DAYS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for SWEEPARR_GRACE_DAYS: {}", grace_days);
                }
            }
        }

        if let Ok(unmonitor) = std::env::var("SWEEPARR_UNMONITOR_AFTER_DELETE") {
            match unmonitor.parse::<bool>() {
                Ok(v) => {
                    self.unmonitor_after_delete = v;
                    tracing::debug!(
                        unmonitor_after_delete = v,
                        "Env override: SWEEPARR_UNMONITOR_AFTER_DELETE"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SWEEPARR_UNMONITOR_AFTER_DELETE: {}",
                        unmonitor
                    );
                }
            }
        }
    }

    /// Validate the configuration
    ///
    /// Validation is advisory: the reload path logs the error and still
    /// activates the snapshot, matching how any parseable document is accepted.
    ///
    /// # Errors
    ///
    /// Returns the first problem found (negative grace period, unusable Sonarr URL).
    pub fn validate(&self) -> Result<()> {
        if let Some(days) = self.grace_days {
            if days < 0 {
                return Err(SweeparrError::Config(format!(
                    "grace_days must not be negative (got {})",
                    days
                ))
                .into());
            }
        }

        for (series, settings) in self.series_settings.iter() {
            if let Some(days) = settings.grace_days {
                if days < 0 {
                    return Err(SweeparrError::Config(format!(
                        "series_settings.{}.grace_days must not be negative (got {})",
                        series, days
                    ))
                    .into());
                }
            }
        }

        if let Some(sonarr) = &self.sonarr {
            let parsed = url::Url::parse(&sonarr.url).map_err(|e| {
                SweeparrError::Config(format!("Invalid sonarr.url '{}': {}", sonarr.url, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SweeparrError::Config(format!(
                    "sonarr.url must use http or https (got {})",
                    parsed.scheme()
                ))
                .into());
            }
        }

        Ok(())
    }
}
