use derive_more::Display;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub parent: u64,
}

/// Canonical category name: levels split on `,`, trimmed, joined with ` / `.
///
/// A trailing `/` on the raw value is dropped. Returns an empty string when
/// the value has no non-blank level.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('/')
        .split(',')
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .join(" / ")
}
