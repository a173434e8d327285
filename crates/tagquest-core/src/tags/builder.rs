use super::changes::{TagChange, TagChangeError, TagChanges};
use crate::model::element::Tags;

/// Records tag changes against a snapshot of an element's current tags.
///
/// Quest types receive one of these when an answer is applied. A premise
/// violation (adding a key that exists, modifying or deleting one that does
/// not) is reported as [`TagChangeError::Conflict`]; touching the same key
/// twice is [`TagChangeError::AlreadyChanged`].
#[derive(Debug)]
pub struct TagChangesBuilder<'a> {
    source: &'a Tags,
    changes: Vec<TagChange>,
}

impl<'a> TagChangesBuilder<'a> {
    #[must_use]
    pub const fn new(source: &'a Tags) -> Self {
        Self {
            source,
            changes: Vec::new(),
        }
    }

    /// Current value of `key` in the snapshot.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.source.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.source.contains_key(key)
    }

    /// # Errors
    ///
    /// Conflict if `key` is already set.
    pub fn add(&mut self, key: &str, value: &str) -> Result<(), TagChangeError> {
        self.ensure_untouched(key)?;
        if let Some(existing) = self.get(key) {
            return Err(conflict(key, format!("already set to '{existing}'")));
        }
        self.push(TagChange::Add {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    /// # Errors
    ///
    /// Conflict if `key` is not set.
    pub fn modify(&mut self, key: &str, value: &str) -> Result<(), TagChangeError> {
        self.ensure_untouched(key)?;
        let Some(before) = self.get(key) else {
            return Err(conflict(key, "is not set".to_string()));
        };
        if before != value {
            self.push(TagChange::Modify {
                key: key.to_string(),
                value_before: before.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// Set `key` to `value` whether or not it exists. Setting the value it
    /// already has records nothing.
    ///
    /// # Errors
    ///
    /// [`TagChangeError::AlreadyChanged`] if `key` was changed before.
    pub fn add_or_modify(&mut self, key: &str, value: &str) -> Result<(), TagChangeError> {
        if self.contains_key(key) {
            self.modify(key, value)
        } else {
            self.add(key, value)
        }
    }

    /// # Errors
    ///
    /// Conflict if `key` is not set.
    pub fn delete(&mut self, key: &str) -> Result<(), TagChangeError> {
        self.ensure_untouched(key)?;
        let Some(before) = self.get(key) else {
            return Err(conflict(key, "is not set".to_string()));
        };
        self.push(TagChange::Delete {
            key: key.to_string(),
            value_before: before.to_string(),
        });
        Ok(())
    }

    /// # Errors
    ///
    /// [`TagChangeError::AlreadyChanged`] if `key` was changed before.
    pub fn delete_if_exists(&mut self, key: &str) -> Result<(), TagChangeError> {
        if self.contains_key(key) {
            self.delete(key)
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub fn build(self) -> TagChanges {
        // keys are unique: every push goes through ensure_untouched
        TagChanges::new(self.changes).unwrap_or_default()
    }

    fn ensure_untouched(&self, key: &str) -> Result<(), TagChangeError> {
        if self.changes.iter().any(|c| c.key() == key) {
            return Err(TagChangeError::AlreadyChanged {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn push(&mut self, change: TagChange) {
        self.changes.push(change);
    }
}

fn conflict(key: &str, reason: String) -> TagChangeError {
    TagChangeError::Conflict {
        key: key.to_string(),
        reason,
    }
}
