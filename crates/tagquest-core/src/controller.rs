//! Quest workflow: answering, hiding, splitting, deleting, noting and undoing.
//!
//! Every mutating operation first requires the quest to be `new`. If it is
//! missing or already moved on (a refresh replaced it, another action won
//! the race), the operation returns `Ok(false)` and changes nothing.
//! Contract violations by the caller or a quest type are `Err`.

use crate::error::QuestError;
use crate::model::element::{Element, ElementKind, LatLon, Tags};
use crate::model::quest::{NoteAnswer, OsmQuest, Quest, QuestGroup, QuestId, QuestStatus};
use crate::model::record::{
    CreateNote, DeleteOsmElement, OsmQuestSplitWay, RecordId, SideRecord, SplitPosition,
    UndoOsmQuest,
};
use crate::quest_type::{AnswerError, QuestTypeRegistry};
use crate::store::Stores;
use crate::tags::{ProtectedKeys, TagChangeError, replacement_changes};
use chrono::Utc;
use tracing::{debug, info, warn};

/// What the user supplied for a quest.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Answer to an OSM quest, in the shape its quest type expects.
    Tags(serde_json::Value),
    /// Comment on a note.
    Note(NoteAnswer),
}

impl Answer {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Tags(_) => "tags",
            Self::Note(_) => "note",
        }
    }
}

pub type QuestResult<T> = Result<T, QuestError>;

/// Decides what every user action on a quest does to the stores.
#[derive(Clone)]
pub struct QuestController {
    stores: Stores,
    registry: QuestTypeRegistry,
    protected: ProtectedKeys,
}

impl QuestController {
    #[must_use]
    pub const fn new(stores: Stores, registry: QuestTypeRegistry, protected: ProtectedKeys) -> Self {
        Self {
            stores,
            registry,
            protected,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &QuestTypeRegistry {
        &self.registry
    }

    /// Apply the user's answer to a quest.
    ///
    /// Returns `Ok(false)` if the quest is not `new`, its element is no
    /// longer cached, or the answer conflicts with the current tags. A
    /// conflict also moves the quest to `failed`.
    ///
    /// # Errors
    ///
    /// A [`QuestError`] when the answer does not fit the quest, the quest type
    /// produced no changes or changed a key twice, a note comment is empty,
    /// or a store fails.
    pub fn solve(
        &self,
        quest_id: QuestId,
        group: QuestGroup,
        answer: &Answer,
        source: &str,
    ) -> QuestResult<bool> {
        match (group, answer) {
            (QuestGroup::Osm, Answer::Tags(value)) => self.solve_osm_quest(quest_id, value, source),
            (QuestGroup::OsmNote, Answer::Note(note)) => self.solve_note_quest(quest_id, note),
            _ => Err(QuestError::AnswerMismatch {
                quest_id,
                group,
                answer: answer.kind(),
            }),
        }
    }

    fn solve_osm_quest(
        &self,
        quest_id: QuestId,
        answer: &serde_json::Value,
        source: &str,
    ) -> QuestResult<bool> {
        let Some(quest) = self.new_osm_quest(quest_id)? else {
            return Ok(false);
        };
        // a download may have evicted the element in the meantime
        let Some(element) = self.stores.elements.get_element(quest.element)? else {
            debug!(quest_id, element = %quest.element, "element no longer cached");
            return Ok(false);
        };
        let quest_type = self
            .registry
            .get(&quest.quest_type)
            .ok_or_else(|| QuestError::UnknownQuestType(quest.quest_type.clone()))?;

        let changes = match quest_type.create_changes(answer, &element.tags) {
            Ok(changes) => changes,
            Err(AnswerError::Malformed(err)) => {
                return Err(QuestError::InvalidAnswer {
                    quest_type: quest.quest_type,
                    source: err,
                });
            }
            Err(AnswerError::Changes(TagChangeError::AlreadyChanged { key })) => {
                return Err(QuestError::DuplicateChange {
                    quest_type: quest.quest_type,
                    key,
                });
            }
            Err(AnswerError::Changes(conflict @ TagChangeError::Conflict { .. })) => {
                warn!(
                    quest_id,
                    quest_type = %quest.quest_type,
                    element = %quest.element,
                    %conflict,
                    "answer conflicts with current tags, dropping quest"
                );
                self.stores.osm_quests.fail_osm_quest(quest_id)?;
                return Ok(false);
            }
        };

        if changes.is_empty() {
            return Err(QuestError::EmptyChanges {
                quest_id,
                quest_type: quest.quest_type,
            });
        }

        debug!(quest_id, quest_type = %quest.quest_type, %changes, "solved quest");
        if !self
            .stores
            .osm_quests
            .answer_osm_quest(quest_id, &changes, source)?
        {
            return Ok(false);
        }
        self.stores.prefs.set_last_solved_at(Utc::now())?;
        Ok(true)
    }

    fn solve_note_quest(&self, quest_id: QuestId, answer: &NoteAnswer) -> QuestResult<bool> {
        match self.stores.note_quests.get_note_quest(quest_id)? {
            Some(quest) if quest.status == QuestStatus::New => {}
            _ => return Ok(false),
        }
        if answer.text.trim().is_empty() {
            return Err(QuestError::EmptyNoteComment { quest_id });
        }
        Ok(self.stores.note_quests.answer_note_quest(quest_id, answer)?)
    }

    /// Create a note about the element of an OSM quest instead of answering it.
    ///
    /// The quest keeps its status. Every other unsolved quest on the same
    /// element is removed while the note is open.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub fn create_note_for_quest(
        &self,
        quest_id: QuestId,
        quest_title: &str,
        text: &str,
        image_paths: &[String],
    ) -> QuestResult<bool> {
        let Some(quest) = self.new_osm_quest(quest_id)? else {
            return Ok(false);
        };

        let record_id = self.stores.records.append_record(&SideRecord::CreateNote(CreateNote {
            text: text.to_string(),
            position: quest.center,
            quest_title: Some(quest_title.to_string()),
            element: Some(quest.element),
            image_paths: image_paths.to_vec(),
        }))?;
        info!(quest_id, record_id, element = %quest.element, "created note for quest");

        self.remove_unsolved_quests_for_element(&quest, Some(quest_id))?;
        Ok(true)
    }

    /// Create a note at `position`, tied to no quest or element.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub fn create_note(
        &self,
        text: &str,
        image_paths: &[String],
        position: LatLon,
    ) -> QuestResult<RecordId> {
        let record_id = self.stores.records.append_record(&SideRecord::CreateNote(CreateNote {
            text: text.to_string(),
            position,
            quest_title: None,
            element: None,
            image_paths: image_paths.to_vec(),
        }))?;
        info!(record_id, %position, "created note");
        Ok(record_id)
    }

    /// Replace the tags of the quest's element with `tags`, keeping keys that
    /// describe the physical feature rather than its occupant.
    ///
    /// The resulting diff becomes the quest's answer and all other unsolved
    /// quests on the element are removed.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub fn replace_element(&self, quest_id: QuestId, tags: &Tags, source: &str) -> QuestResult<bool> {
        let Some(quest) = self.new_osm_quest(quest_id)? else {
            return Ok(false);
        };
        let Some(element) = self.stores.elements.get_element(quest.element)? else {
            debug!(quest_id, element = %quest.element, "element no longer cached");
            return Ok(false);
        };

        let changes = replacement_changes(&element.tags, tags, &self.protected);
        info!(
            quest_id,
            quest_type = %quest.quest_type,
            element = %quest.element,
            %changes,
            "replaced element"
        );
        if !self
            .stores
            .osm_quests
            .answer_osm_quest(quest_id, &changes, source)?
        {
            return Ok(false);
        }
        self.remove_unsolved_quests_for_element(&quest, None)?;
        self.stores.prefs.set_last_solved_at(Utc::now())?;
        Ok(true)
    }

    /// Delete the element the quest is about.
    ///
    /// Removes every quest on the element, whatever its status, and the
    /// cached element with them.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub fn delete_element(&self, quest_id: QuestId, source: &str) -> QuestResult<bool> {
        let Some(quest) = self.new_osm_quest(quest_id)? else {
            return Ok(false);
        };

        let record_id =
            self.stores
                .records
                .append_record(&SideRecord::DeleteElement(DeleteOsmElement {
                    quest_id,
                    quest_type: quest.quest_type.clone(),
                    element: quest.element,
                    source: source.to_string(),
                    center: quest.center,
                }))?;
        info!(
            quest_id,
            record_id,
            quest_type = %quest.quest_type,
            element = %quest.element,
            "deleted element"
        );

        let removed = self
            .stores
            .osm_quests
            .delete_all_osm_quests_for_element(quest.element)?;
        let purged = self.stores.elements.delete_unreferenced_elements()?;
        debug!(removed, purged, "removed quests of deleted element");
        Ok(true)
    }

    /// Split the quest's way at `splits`.
    ///
    /// The record carries the quest types still unsolved on the way so they
    /// can be asked again on the resulting ways.
    ///
    /// # Errors
    ///
    /// [`QuestError::InvalidSplit`] if `splits` is empty, holds a position
    /// outside its segment, or the quest is not about a way. These are only
    /// checked for a quest that is still `new`. Store failures otherwise.
    pub fn split_way(
        &self,
        quest_id: QuestId,
        splits: &[SplitPosition],
        source: &str,
    ) -> QuestResult<bool> {
        let Some(quest) = self.new_osm_quest(quest_id)? else {
            return Ok(false);
        };
        if splits.is_empty() {
            return Err(QuestError::InvalidSplit {
                quest_id,
                reason: "no split positions given",
            });
        }
        if !splits.iter().all(SplitPosition::is_valid) {
            return Err(QuestError::InvalidSplit {
                quest_id,
                reason: "split delta must lie strictly between 0 and 1",
            });
        }
        if quest.element.kind != ElementKind::Way {
            return Err(QuestError::InvalidSplit {
                quest_id,
                reason: "only ways can be split",
            });
        }

        let unsolved_quest_types = self
            .stores
            .osm_quests
            .unsolved_quest_types_for_element(quest.element)?;
        let record_id = self
            .stores
            .records
            .append_record(&SideRecord::SplitWay(OsmQuestSplitWay {
                quest_id,
                quest_type: quest.quest_type.clone(),
                way_id: quest.element.id,
                source: source.to_string(),
                splits: splits.to_vec(),
                unsolved_quest_types,
            }))?;
        info!(
            quest_id,
            record_id,
            way_id = quest.element.id,
            splits = splits.len(),
            "split way"
        );

        self.remove_unsolved_quests_for_element(&quest, None)?;
        Ok(true)
    }

    /// Hide a quest without answering it.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub fn hide(&self, quest_id: QuestId, group: QuestGroup) -> QuestResult<bool> {
        let hidden = match group {
            QuestGroup::Osm => self.stores.osm_quests.hide_osm_quest(quest_id)?,
            QuestGroup::OsmNote => self.stores.note_quests.hide_note_quest(quest_id)?,
        };
        debug!(quest_id, %group, hidden, "hide quest");
        Ok(hidden)
    }

    /// Undo the user's last action on an OSM quest.
    ///
    /// An answered or hidden quest simply goes back to `new`. A closed quest
    /// was already uploaded, so it goes back to `new` and an
    /// [`UndoOsmQuest`] record queues the reverse edit.
    ///
    /// # Errors
    ///
    /// [`QuestError::NotUndoable`] if the quest is `new` or `failed`. Store
    /// failures otherwise.
    pub fn undo(&self, quest_id: QuestId) -> QuestResult<bool> {
        let Some(quest) = self.stores.osm_quests.get_osm_quest(quest_id)? else {
            return Ok(false);
        };
        match quest.status {
            QuestStatus::Answered | QuestStatus::Hidden => {
                Ok(self.stores.osm_quests.undo_osm_quest(quest_id)?)
            }
            QuestStatus::Closed => {
                if !self.stores.osm_quests.revert_uploaded_osm_quest(quest_id)? {
                    return Ok(false);
                }
                let record_id = self
                    .stores
                    .records
                    .append_record(&SideRecord::UndoQuest(UndoOsmQuest { quest }))?;
                info!(quest_id, record_id, "queued revert of uploaded answer");
                Ok(true)
            }
            status @ (QuestStatus::New | QuestStatus::Failed) => {
                Err(QuestError::NotUndoable { quest_id, status })
            }
        }
    }

    /// # Errors
    ///
    /// Store failures only.
    pub fn get(&self, quest_id: QuestId, group: QuestGroup) -> QuestResult<Option<Quest>> {
        Ok(match group {
            QuestGroup::Osm => self
                .stores
                .osm_quests
                .get_osm_quest(quest_id)?
                .map(Quest::Osm),
            QuestGroup::OsmNote => self
                .stores
                .note_quests
                .get_note_quest(quest_id)?
                .map(Quest::OsmNote),
        })
    }

    /// Cached element the quest is about.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub fn osm_element(&self, quest: &OsmQuest) -> QuestResult<Option<Element>> {
        Ok(self.stores.elements.get_element(quest.element)?)
    }

    fn new_osm_quest(&self, quest_id: QuestId) -> QuestResult<Option<OsmQuest>> {
        Ok(self
            .stores
            .osm_quests
            .get_osm_quest(quest_id)?
            .filter(|quest| quest.status == QuestStatus::New))
    }

    fn remove_unsolved_quests_for_element(
        &self,
        quest: &OsmQuest,
        keep: Option<QuestId>,
    ) -> QuestResult<()> {
        let removed = self
            .stores
            .osm_quests
            .delete_unsolved_osm_quests_for_element(quest.element, keep)?;
        let purged = self.stores.elements.delete_unreferenced_elements()?;
        debug!(element = %quest.element, removed, purged, "removed unsolved quests");
        Ok(())
    }
}
