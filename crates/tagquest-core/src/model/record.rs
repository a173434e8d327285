//! Side records: append-only intents awaiting upload.
//!
//! The controller writes these and never reads them back; an upload component
//! consumes them later.

use super::element::{ElementKey, LatLon};
use super::quest::{OsmQuest, QuestId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Id assigned to a side record when it is appended.
pub type RecordId = i64;

/// Where a way should be split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum SplitPosition {
    /// Split at an existing vertex of the way.
    Point { position: LatLon },
    /// Split between two consecutive vertices, `delta` of the way from
    /// `before` to `after`.
    Line {
        before: LatLon,
        after: LatLon,
        delta: f64,
    },
}

impl SplitPosition {
    /// `delta` must lie strictly between the two vertices.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Point { .. } => true,
            Self::Line { delta, .. } => *delta > 0.0 && *delta < 1.0,
        }
    }
}

/// Create a new note, optionally tied to the quest and element that prompted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNote {
    pub text: String,
    pub position: LatLon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_paths: Vec<String>,
}

/// Delete the element a quest was about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteOsmElement {
    pub quest_id: QuestId,
    pub quest_type: String,
    pub element: ElementKey,
    pub source: String,
    pub center: LatLon,
}

/// Split a way; `unsolved_quest_types` lets the split regenerate equivalent
/// quests on the resulting ways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmQuestSplitWay {
    pub quest_id: QuestId,
    pub quest_type: String,
    pub way_id: i64,
    pub source: String,
    pub splits: Vec<SplitPosition>,
    pub unsolved_quest_types: BTreeSet<String>,
}

/// Reverse an already uploaded answer. Holds the quest as it was before undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoOsmQuest {
    pub quest: OsmQuest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideRecordKind {
    CreateNote,
    DeleteElement,
    SplitWay,
    UndoQuest,
}

impl SideRecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateNote => "create_note",
            Self::DeleteElement => "delete_element",
            Self::SplitWay => "split_way",
            Self::UndoQuest => "undo_quest",
        }
    }
}

impl fmt::Display for SideRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any of the four side records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideRecord {
    CreateNote(CreateNote),
    DeleteElement(DeleteOsmElement),
    SplitWay(OsmQuestSplitWay),
    UndoQuest(UndoOsmQuest),
}

impl SideRecord {
    #[must_use]
    pub const fn kind(&self) -> SideRecordKind {
        match self {
            Self::CreateNote(_) => SideRecordKind::CreateNote,
            Self::DeleteElement(_) => SideRecordKind::DeleteElement,
            Self::SplitWay(_) => SideRecordKind::SplitWay,
            Self::UndoQuest(_) => SideRecordKind::UndoQuest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateNote, SideRecord, SideRecordKind, SplitPosition};
    use crate::model::element::{ElementKey, LatLon};

    #[test]
    fn side_record_json_is_kind_tagged() {
        let record = SideRecord::CreateNote(CreateNote {
            text: "Shop closed".into(),
            position: LatLon::new(1.0, 2.0),
            quest_title: Some("What kind of parking is this?".into()),
            element: Some(ElementKey::node(3)),
            image_paths: vec![],
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "create_note");
        assert_eq!(json["element"]["kind"], "node");
        assert!(json.get("image_paths").is_none());

        let back: SideRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.kind(), SideRecordKind::CreateNote);
    }

    #[test]
    fn line_split_delta_must_be_inside_segment() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 1.0);
        assert!(SplitPosition::Line { before: a, after: b, delta: 0.5 }.is_valid());
        assert!(!SplitPosition::Line { before: a, after: b, delta: 0.0 }.is_valid());
        assert!(!SplitPosition::Line { before: a, after: b, delta: 1.0 }.is_valid());
        assert!(SplitPosition::Point { position: a }.is_valid());
    }
}
