use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Image filters a worker knows how to apply.
///
/// This is the closed whitelist. Whether a filter is currently accepted
/// is decided by [`FilterRegistry`], not by membership here.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Filter {
    Grayscale,
    Sepia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Enabled,
    Disabled,
}

/// Maps every known filter to whether submissions may use it right now.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: HashMap<Filter, Availability>,
}

impl FilterRegistry {
    /// Every filter enabled except the ones listed.
    pub fn new(disabled: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: HashMap<Filter, Availability> = Filter::iter()
            .map(|filter| (filter, Availability::Enabled))
            .collect();
        for filter in disabled {
            filters.insert(filter, Availability::Disabled);
        }
        Self { filters }
    }

    /// Build from operator-supplied filter names (e.g. `DISABLED_FILTERS`).
    /// Blank entries are skipped; a name outside the whitelist is an error.
    pub fn with_disabled<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownFilterName> {
        let disabled = names
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .map(|name| Filter::from_str(name).map_err(|_| UnknownFilterName(name.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(disabled))
    }

    /// Look up a filter by its wire name. `None` means it is not a filter at all.
    pub fn lookup(&self, name: &str) -> Option<(Filter, Availability)> {
        let filter = Filter::from_str(name).ok()?;
        let availability = self
            .filters
            .get(&filter)
            .copied()
            .unwrap_or(Availability::Disabled);
        Some((filter, availability))
    }

    pub fn enabled(&self) -> impl Iterator<Item = Filter> + '_ {
        Filter::iter().filter(|f| self.filters.get(f) == Some(&Availability::Enabled))
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new([Filter::Sepia])
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown filter name in configuration: {0}")]
pub struct UnknownFilterName(pub String);
