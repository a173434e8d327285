//! Quest types: pure functions from an answer to a tag diff.
//!
//! A quest type declares the shape of its answer and records the tag changes
//! that answer implies on a [`TagChangesBuilder`]. The registry erases the
//! answer type so the controller can look quest types up by name and feed
//! them JSON answers.

use crate::model::element::Tags;
use crate::tags::{TagChangeError, TagChanges, TagChangesBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A kind of question asked about an element.
pub trait QuestType: Send + Sync + 'static {
    type Answer: DeserializeOwned;

    /// Registry key, stored on every quest of this type.
    fn name(&self) -> &'static str;

    fn commit_message(&self) -> &'static str;

    /// Record the changes `answer` implies.
    ///
    /// # Errors
    ///
    /// [`TagChangeError::Conflict`] when the current tags no longer fit the
    /// question.
    fn apply_answer_to(
        &self,
        answer: Self::Answer,
        changes: &mut TagChangesBuilder<'_>,
    ) -> Result<(), TagChangeError>;
}

/// Why an answer could not be turned into changes.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("malformed answer: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Changes(#[from] TagChangeError),
}

/// Object-safe view of a [`QuestType`] taking JSON answers.
pub trait DynQuestType: Send + Sync {
    fn name(&self) -> &'static str;

    fn commit_message(&self) -> &'static str;

    /// # Errors
    ///
    /// See [`AnswerError`].
    fn create_changes(
        &self,
        answer: &serde_json::Value,
        tags: &Tags,
    ) -> Result<TagChanges, AnswerError>;
}

impl<Q: QuestType> DynQuestType for Q {
    fn name(&self) -> &'static str {
        QuestType::name(self)
    }

    fn commit_message(&self) -> &'static str {
        QuestType::commit_message(self)
    }

    fn create_changes(
        &self,
        answer: &serde_json::Value,
        tags: &Tags,
    ) -> Result<TagChanges, AnswerError> {
        let answer = Q::Answer::deserialize(answer)?;
        let mut builder = TagChangesBuilder::new(tags);
        self.apply_answer_to(answer, &mut builder)?;
        Ok(builder.build())
    }
}

/// Quest types by name.
#[derive(Clone, Default)]
pub struct QuestTypeRegistry {
    types: BTreeMap<&'static str, Arc<dyn DynQuestType>>,
}

impl QuestTypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every quest type shipped with this crate.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(AddParkingType);
        registry
    }

    /// Register `quest_type`, replacing any previous one with the same name.
    pub fn register<Q: QuestType>(&mut self, quest_type: Q) -> &mut Self {
        self.types
            .insert(QuestType::name(&quest_type), Arc::new(quest_type));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn DynQuestType> {
        self.types.get(name).map(AsRef::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }
}

impl fmt::Debug for QuestTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.types.keys()).finish()
    }
}

/// How a car park is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParkingType {
    Surface,
    StreetSide,
    Lane,
    Underground,
    #[serde(rename = "multi-storey")]
    MultiStorey,
    Rooftop,
}

impl ParkingType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::StreetSide => "street_side",
            Self::Lane => "lane",
            Self::Underground => "underground",
            Self::MultiStorey => "multi-storey",
            Self::Rooftop => "rooftop",
        }
    }
}

/// Asks for `parking=*` on `amenity=parking` without a specific type.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddParkingType;

impl QuestType for AddParkingType {
    type Answer = ParkingType;

    fn name(&self) -> &'static str {
        "AddParkingType"
    }

    fn commit_message(&self) -> &'static str {
        "Add parking type"
    }

    fn apply_answer_to(
        &self,
        answer: ParkingType,
        changes: &mut TagChangesBuilder<'_>,
    ) -> Result<(), TagChangeError> {
        if changes.get("amenity") != Some("parking") {
            return Err(TagChangeError::Conflict {
                key: "amenity".to_string(),
                reason: "element is no longer a car park".to_string(),
            });
        }
        if let Some(existing) = changes.get("parking").filter(|v| *v != "yes") {
            return Err(TagChangeError::Conflict {
                key: "parking".to_string(),
                reason: format!("parking type already set to '{existing}'"),
            });
        }
        changes.add_or_modify("parking", answer.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{AddParkingType, AnswerError, DynQuestType, QuestTypeRegistry};
    use crate::model::element::Tags;
    use crate::tags::{TagChange, TagChangeError};
    use serde_json::json;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn builtin_registry_knows_parking_type() {
        let registry = QuestTypeRegistry::with_builtin();
        let quest_type = registry.get("AddParkingType").expect("registered");
        assert_eq!(quest_type.commit_message(), "Add parking type");
        assert!(registry.get("AddRoadName").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["AddParkingType"]);
    }

    #[test]
    fn parking_answer_modifies_default_yes() {
        let current = tags(&[("amenity", "parking"), ("parking", "yes")]);
        let changes = AddParkingType
            .create_changes(&json!("surface"), &current)
            .unwrap();
        assert_eq!(
            changes.as_slice(),
            &[TagChange::Modify {
                key: "parking".into(),
                value_before: "yes".into(),
                value: "surface".into(),
            }]
        );
    }

    #[test]
    fn parking_answer_adds_missing_key() {
        let current = tags(&[("amenity", "parking")]);
        let changes = AddParkingType
            .create_changes(&json!("multi-storey"), &current)
            .unwrap();
        let mut applied = current.clone();
        changes.apply_to(&mut applied).unwrap();
        assert_eq!(
            applied,
            tags(&[("amenity", "parking"), ("parking", "multi-storey")])
        );
    }

    #[test]
    fn unknown_parking_value_is_malformed() {
        let current = tags(&[("amenity", "parking")]);
        let err = AddParkingType
            .create_changes(&json!("flying"), &current)
            .unwrap_err();
        assert!(matches!(err, AnswerError::Malformed(_)));
    }

    #[test]
    fn specific_parking_type_is_a_conflict() {
        let current = tags(&[("amenity", "parking"), ("parking", "underground")]);
        let err = AddParkingType
            .create_changes(&json!("surface"), &current)
            .unwrap_err();
        assert!(matches!(
            err,
            AnswerError::Changes(TagChangeError::Conflict { ref key, .. }) if key == "parking"
        ));
    }

    #[test]
    fn retagged_element_is_a_conflict() {
        let current = tags(&[("amenity", "fuel")]);
        let err = AddParkingType
            .create_changes(&json!("surface"), &current)
            .unwrap_err();
        assert!(matches!(
            err,
            AnswerError::Changes(TagChangeError::Conflict { .. })
        ));
    }
}
