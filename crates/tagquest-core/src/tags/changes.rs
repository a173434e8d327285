use crate::model::element::Tags;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One atomic change to a tag mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum TagChange {
    Add {
        key: String,
        value: String,
    },
    Modify {
        key: String,
        value_before: String,
        value: String,
    },
    Delete {
        key: String,
        value_before: String,
    },
}

impl TagChange {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Add { key, .. } | Self::Modify { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    /// The change that undoes this one.
    #[must_use]
    pub fn reversed(&self) -> Self {
        match self {
            Self::Add { key, value } => Self::Delete {
                key: key.clone(),
                value_before: value.clone(),
            },
            Self::Modify {
                key,
                value_before,
                value,
            } => Self::Modify {
                key: key.clone(),
                value_before: value.clone(),
                value: value_before.clone(),
            },
            Self::Delete { key, value_before } => Self::Add {
                key: key.clone(),
                value: value_before.clone(),
            },
        }
    }

    /// Check that `tags` still satisfy the premise of this change.
    fn check(&self, tags: &Tags) -> Result<(), TagChangeError> {
        let current = tags.get(self.key()).map(String::as_str);
        let premise_holds = match self {
            Self::Add { .. } => current.is_none(),
            Self::Modify { value_before, .. } | Self::Delete { value_before, .. } => {
                current == Some(value_before.as_str())
            }
        };
        if premise_holds {
            return Ok(());
        }
        Err(TagChangeError::Conflict {
            key: self.key().to_string(),
            reason: match current {
                Some(value) => format!("current value is '{value}'"),
                None => "key is not set".to_string(),
            },
        })
    }

    fn apply_unchecked(&self, tags: &mut Tags) {
        match self {
            Self::Add { key, value } | Self::Modify { key, value, .. } => {
                tags.insert(key.clone(), value.clone());
            }
            Self::Delete { key, .. } => {
                tags.remove(key);
            }
        }
    }
}

impl fmt::Display for TagChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { key, value } => write!(f, "ADD \"{key}\"=\"{value}\""),
            Self::Modify {
                key,
                value_before,
                value,
            } => write!(f, "MODIFY \"{key}\"=\"{value_before}\" -> \"{key}\"=\"{value}\""),
            Self::Delete { key, value_before } => write!(f, "DELETE \"{key}\"=\"{value_before}\""),
        }
    }
}

/// Failure to build or apply a change list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagChangeError {
    /// The tags no longer match what the change assumed.
    #[error("conflict on tag '{key}': {reason}")]
    Conflict { key: String, reason: String },
    /// A second change was recorded for a key that already has one.
    #[error("tag '{key}' is already being changed")]
    AlreadyChanged { key: String },
}

/// Ordered list of tag changes with at most one change per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TagChange>", into = "Vec<TagChange>")]
pub struct TagChanges {
    changes: Vec<TagChange>,
}

impl TagChanges {
    /// # Errors
    ///
    /// Returns [`TagChangeError::AlreadyChanged`] when two changes share a key.
    pub fn new(changes: Vec<TagChange>) -> Result<Self, TagChangeError> {
        let mut seen = HashSet::with_capacity(changes.len());
        for change in &changes {
            if !seen.insert(change.key()) {
                return Err(TagChangeError::AlreadyChanged {
                    key: change.key().to_string(),
                });
            }
        }
        Ok(Self { changes })
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TagChange> {
        self.changes.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TagChange] {
        &self.changes
    }

    /// Apply all changes to `tags`.
    ///
    /// All premises are checked before anything is written, so on conflict
    /// `tags` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TagChangeError::Conflict`] for the first change whose premise
    /// does not hold.
    pub fn apply_to(&self, tags: &mut Tags) -> Result<(), TagChangeError> {
        for change in &self.changes {
            change.check(tags)?;
        }
        for change in &self.changes {
            change.apply_unchecked(tags);
        }
        Ok(())
    }

    /// The change list that restores the tags this one was applied to.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            changes: self.changes.iter().map(TagChange::reversed).collect(),
        }
    }
}

impl TryFrom<Vec<TagChange>> for TagChanges {
    type Error = TagChangeError;

    fn try_from(changes: Vec<TagChange>) -> Result<Self, Self::Error> {
        Self::new(changes)
    }
}

impl From<TagChanges> for Vec<TagChange> {
    fn from(changes: TagChanges) -> Self {
        changes.changes
    }
}

impl<'a> IntoIterator for &'a TagChanges {
    type Item = &'a TagChange;
    type IntoIter = std::slice::Iter<'a, TagChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl fmt::Display for TagChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{change}")?;
        }
        f.write_str("]")
    }
}
