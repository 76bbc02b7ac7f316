//! Grace-period policy
//!
//! Decides whether a watched episode should be deleted right away. Only a
//! grace period of exactly zero triggers deletion; longer grace periods are
//! recorded but nothing sweeps them later.

use crate::config::Config;

/// Where the effective grace period came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraceSource {
    /// `series_settings` key equal to the series title
    ExactOverride,
    /// `series_settings` key equal ignoring case; holds the matched key
    CaseInsensitiveOverride(String),
    /// Global `grace_days`
    Global,
}

/// Outcome of evaluating the policy for one series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    /// Effective grace period; `None` when an override omits `grace_days`
    pub grace_days: Option<i64>,
    pub source: GraceSource,
}

impl PolicyDecision {
    /// True when the episode should be deleted now
    pub fn delete_now(&self) -> bool {
        self.grace_days == Some(0)
    }
}

/// Resolve the effective grace period for `series`
///
/// An exact key match wins. Otherwise the first key equal ignoring case, in
/// document order. Otherwise the global value.
pub fn evaluate(series: &str, config: &Config) -> PolicyDecision {
    if let Some(settings) = config.series_settings.get(series) {
        return PolicyDecision {
            grace_days: settings.grace_days,
            source: GraceSource::ExactOverride,
        };
    }

    if let Some((key, settings)) = config.series_settings.find_case_insensitive(series) {
        return PolicyDecision {
            grace_days: settings.grace_days,
            source: GraceSource::CaseInsensitiveOverride(key.to_string()),
        };
    }

    PolicyDecision {
        grace_days: config.grace_days,
        source: GraceSource::Global,
    }
}
