//! Per-user sets of post ids (likes, favorites).
//!
//! Sets are persisted as plain arrays on the profile document. The array
//! order is kept stable so that a write-back only differs from the stored
//! value by the toggled id; duplicates are collapsed on construction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct MembershipSet {
    ids: Vec<String>,
}

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Return the set with `id` removed when present, added otherwise,
    /// along with whether the id is active afterwards.
    pub fn toggled(&self, id: &str) -> (Self, bool) {
        if self.contains(id) {
            let ids = self
                .ids
                .iter()
                .filter(|existing| existing.as_str() != id)
                .cloned()
                .collect();
            (Self { ids }, false)
        } else {
            let mut ids = self.ids.clone();
            ids.push(id.to_string());
            (Self { ids }, true)
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }
}

impl From<Vec<String>> for MembershipSet {
    fn from(values: Vec<String>) -> Self {
        let mut ids: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            if !ids.contains(&value) {
                ids.push(value);
            }
        }
        Self { ids }
    }
}

impl From<MembershipSet> for Vec<String> {
    fn from(set: MembershipSet) -> Self {
        set.ids
    }
}

impl<'a> FromIterator<&'a str> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self::from(iter.into_iter().map(str::to_string).collect::<Vec<_>>())
    }
}
