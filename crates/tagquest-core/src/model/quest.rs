use super::element::{ElementKey, LatLon};
use super::{ParseEnumError, normalize};
use crate::tags::TagChanges;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Quest identity, unique within its [`QuestGroup`].
pub type QuestId = i64;

/// The lifecycle states of a quest.
///
/// Transitions:
/// - `new -> answered` (valid answer), `new -> hidden` (dismissed),
///   `new -> failed` (answer conflicted with current data)
/// - `answered -> closed` (uploaded)
/// - `answered | hidden | closed -> new` (undo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    New,
    Answered,
    Hidden,
    Closed,
    Failed,
}

impl QuestStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Answered => "answered",
            Self::Hidden => "hidden",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }

    /// No answer that will be uploaded exists for the quest.
    #[must_use]
    pub const fn is_unsolved(self) -> bool {
        matches!(self, Self::New | Self::Hidden)
    }

    #[must_use]
    pub const fn is_undoable(self) -> bool {
        matches!(self, Self::Answered | Self::Hidden | Self::Closed)
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "new" => Ok(Self::New),
            "answered" => Ok(Self::Answered),
            "hidden" => Ok(Self::Hidden),
            "closed" => Ok(Self::Closed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseEnumError {
                expected: "quest status",
                got: s.to_string(),
            }),
        }
    }
}

/// The two quest families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestGroup {
    Osm,
    OsmNote,
}

impl QuestGroup {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Osm => "osm",
            Self::OsmNote => "osm_note",
        }
    }
}

impl fmt::Display for QuestGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestGroup {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).replace('-', "_").as_str() {
            "osm" => Ok(Self::Osm),
            "osm_note" | "note" => Ok(Self::OsmNote),
            _ => Err(ParseEnumError {
                expected: "quest group",
                got: s.to_string(),
            }),
        }
    }
}

/// A quest asking about the tags of one cached element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmQuest {
    pub id: QuestId,
    pub quest_type: String,
    pub element: ElementKey,
    pub center: LatLon,
    pub status: QuestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<TagChanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_source: Option<String>,
    pub last_update: DateTime<Utc>,
}

impl OsmQuest {
    /// A fresh quest in state `new`.
    #[must_use]
    pub fn new(
        id: QuestId,
        quest_type: impl Into<String>,
        element: ElementKey,
        center: LatLon,
    ) -> Self {
        Self {
            id,
            quest_type: quest_type.into(),
            element,
            center,
            status: QuestStatus::New,
            changes: None,
            changes_source: None,
            last_update: Utc::now(),
        }
    }
}

/// A quest asking the user to comment on an existing map note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmNoteQuest {
    pub id: QuestId,
    pub note_id: i64,
    pub center: LatLon,
    pub status: QuestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_paths: Vec<String>,
    pub last_update: DateTime<Utc>,
}

impl OsmNoteQuest {
    #[must_use]
    pub fn new(id: QuestId, note_id: i64, center: LatLon) -> Self {
        Self {
            id,
            note_id,
            center,
            status: QuestStatus::New,
            comment: None,
            image_paths: Vec::new(),
            last_update: Utc::now(),
        }
    }
}

/// The user's reply to a note quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAnswer {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_paths: Vec<String>,
}

impl NoteAnswer {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_paths: Vec::new(),
        }
    }
}

/// A quest of either family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "group", rename_all = "snake_case")]
pub enum Quest {
    Osm(OsmQuest),
    OsmNote(OsmNoteQuest),
}

impl Quest {
    #[must_use]
    pub const fn id(&self) -> QuestId {
        match self {
            Self::Osm(q) => q.id,
            Self::OsmNote(q) => q.id,
        }
    }

    #[must_use]
    pub const fn group(&self) -> QuestGroup {
        match self {
            Self::Osm(_) => QuestGroup::Osm,
            Self::OsmNote(_) => QuestGroup::OsmNote,
        }
    }

    #[must_use]
    pub const fn status(&self) -> QuestStatus {
        match self {
            Self::Osm(q) => q.status,
            Self::OsmNote(q) => q.status,
        }
    }

    #[must_use]
    pub const fn center(&self) -> LatLon {
        match self {
            Self::Osm(q) => q.center,
            Self::OsmNote(q) => q.center,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Quest, QuestGroup, QuestStatus};
    use std::str::FromStr;

    #[test]
    fn status_display_parse_roundtrips() {
        for value in [
            QuestStatus::New,
            QuestStatus::Answered,
            QuestStatus::Hidden,
            QuestStatus::Closed,
            QuestStatus::Failed,
        ] {
            let rendered = value.to_string();
            assert_eq!(QuestStatus::from_str(&rendered).unwrap(), value);
        }
        assert!(QuestStatus::from_str("reverted").is_err());
    }

    #[test]
    fn undoable_and_unsolved_sets() {
        assert!(!QuestStatus::New.is_undoable());
        assert!(!QuestStatus::Failed.is_undoable());
        assert!(QuestStatus::Answered.is_undoable());
        assert!(QuestStatus::Hidden.is_undoable());
        assert!(QuestStatus::Closed.is_undoable());

        assert!(QuestStatus::New.is_unsolved());
        assert!(QuestStatus::Hidden.is_unsolved());
        assert!(!QuestStatus::Answered.is_unsolved());
        assert!(!QuestStatus::Closed.is_unsolved());
        assert!(!QuestStatus::Failed.is_unsolved());
    }

    #[test]
    fn group_accepts_aliases() {
        assert_eq!(QuestGroup::from_str("osm").unwrap(), QuestGroup::Osm);
        assert_eq!(QuestGroup::from_str("note").unwrap(), QuestGroup::OsmNote);
        assert_eq!(QuestGroup::from_str("osm-note").unwrap(), QuestGroup::OsmNote);
        assert_eq!(
            serde_json::to_string(&QuestGroup::OsmNote).unwrap(),
            "\"osm_note\""
        );
    }

    #[test]
    fn quest_accessors_dispatch_on_group() {
        use super::{OsmNoteQuest, OsmQuest};
        use crate::model::element::{ElementKey, LatLon};

        let osm = Quest::Osm(OsmQuest::new(
            42,
            "AddParkingType",
            ElementKey::way(7),
            LatLon::new(1.0, 2.0),
        ));
        assert_eq!(osm.id(), 42);
        assert_eq!(osm.group(), QuestGroup::Osm);
        assert_eq!(osm.status(), QuestStatus::New);

        let note = Quest::OsmNote(OsmNoteQuest::new(5, 900, LatLon::new(3.0, 4.0)));
        assert_eq!(note.group(), QuestGroup::OsmNote);
        assert!((note.center().lat - 3.0).abs() < f64::EPSILON);
    }
}
