//! Predictor identifiers and canonical predictor sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest numeric identifier denoting a snow-water-equivalent index.
pub const SWE_ID_FLOOR: i64 = 9000;

/// Opaque predictor identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictorId(String);

impl PredictorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Snow-water-equivalent indices carry numeric ids of at least 9000.
    /// Their coefficients are constrained to be positive.
    pub fn is_snow_water_equivalent(&self) -> bool {
        self.0
            .trim()
            .parse::<i64>()
            .map(|n| n >= SWE_ID_FLOOR)
            .unwrap_or(false)
    }
}

impl fmt::Display for PredictorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PredictorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PredictorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for PredictorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sorted, deduplicated set of predictor ids.
///
/// Equality and hashing follow the sorted id list, so a set doubles as
/// the memoization key of a candidate model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<PredictorId>", into = "Vec<PredictorId>")]
pub struct PredictorSet(Vec<PredictorId>);

impl PredictorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &PredictorId) -> bool {
        self.0.binary_search(id).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PredictorId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[PredictorId] {
        &self.0
    }

    /// Copy with `id` added.
    pub fn with(&self, id: &PredictorId) -> Self {
        let mut out = self.clone();
        if let Err(pos) = out.0.binary_search(id) {
            out.0.insert(pos, id.clone());
        }
        out
    }

    /// Copy with `id` removed.
    pub fn without(&self, id: &PredictorId) -> Self {
        let mut out = self.clone();
        if let Ok(pos) = out.0.binary_search(id) {
            out.0.remove(pos);
        }
        out
    }

    /// Copy with every id in `ids` removed.
    pub fn without_all<'a>(&self, ids: impl IntoIterator<Item = &'a PredictorId>) -> Self {
        ids.into_iter().fold(self.clone(), |set, id| set.without(id))
    }

    pub fn is_superset_of(&self, other: &PredictorSet) -> bool {
        other.iter().all(|id| self.contains(id))
    }

    /// Ids of `self` that are not in `other`, in sorted order.
    pub fn difference<'a>(&'a self, other: &'a PredictorSet) -> impl Iterator<Item = &'a PredictorId> {
        self.0.iter().filter(move |id| !other.contains(id))
    }
}

impl FromIterator<PredictorId> for PredictorSet {
    fn from_iter<I: IntoIterator<Item = PredictorId>>(iter: I) -> Self {
        let mut ids: Vec<PredictorId> = iter.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }
}

impl<'a> FromIterator<&'a PredictorId> for PredictorSet {
    fn from_iter<I: IntoIterator<Item = &'a PredictorId>>(iter: I) -> Self {
        iter.into_iter().cloned().collect()
    }
}

impl From<Vec<PredictorId>> for PredictorSet {
    fn from(ids: Vec<PredictorId>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<PredictorSet> for Vec<PredictorId> {
    fn from(set: PredictorSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a PredictorSet {
    type Item = &'a PredictorId;
    type IntoIter = std::slice::Iter<'a, PredictorId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PredictorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(id.as_str())?;
        }
        f.write_str("]")
    }
}
