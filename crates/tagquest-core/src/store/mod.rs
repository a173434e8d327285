//! Store facades consumed by the controller.
//!
//! Every method is atomic on its own. Status transitions are conditional:
//! they only apply when the quest is still in the expected state and report
//! `false` otherwise, which is how a concurrent refresh that removed or
//! changed a quest between the controller's read and write is detected.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::model::element::{Element, ElementKey};
use crate::model::quest::{NoteAnswer, OsmNoteQuest, OsmQuest, QuestId};
use crate::model::record::{RecordId, SideRecord};
use crate::tags::TagChanges;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Quests about the tags of cached elements.
pub trait OsmQuestStore: Send + Sync {
    fn get_osm_quest(&self, id: QuestId) -> StoreResult<Option<OsmQuest>>;

    /// Insert or overwrite a quest.
    fn put_osm_quest(&self, quest: &OsmQuest) -> StoreResult<()>;

    /// `new -> answered`, storing the changes and their source.
    fn answer_osm_quest(&self, id: QuestId, changes: &TagChanges, source: &str)
    -> StoreResult<bool>;

    /// `new -> hidden`.
    fn hide_osm_quest(&self, id: QuestId) -> StoreResult<bool>;

    /// `new -> failed`.
    fn fail_osm_quest(&self, id: QuestId) -> StoreResult<bool>;

    /// `answered | hidden -> new`, dropping any stored changes.
    fn undo_osm_quest(&self, id: QuestId) -> StoreResult<bool>;

    /// `closed -> new`, dropping the uploaded changes.
    fn revert_uploaded_osm_quest(&self, id: QuestId) -> StoreResult<bool>;

    /// `answered -> closed`, called once the changes were uploaded.
    fn close_osm_quest(&self, id: QuestId) -> StoreResult<bool>;

    /// Delete unsolved (`new` or `hidden`) quests on `element`, except `keep`.
    fn delete_unsolved_osm_quests_for_element(
        &self,
        element: ElementKey,
        keep: Option<QuestId>,
    ) -> StoreResult<usize>;

    /// Delete every quest on `element`, whatever its status.
    fn delete_all_osm_quests_for_element(&self, element: ElementKey) -> StoreResult<usize>;

    fn unsolved_quest_types_for_element(&self, element: ElementKey)
    -> StoreResult<BTreeSet<String>>;
}

/// Quests asking for a comment on an existing note.
pub trait NoteQuestStore: Send + Sync {
    fn get_note_quest(&self, id: QuestId) -> StoreResult<Option<OsmNoteQuest>>;

    fn put_note_quest(&self, quest: &OsmNoteQuest) -> StoreResult<()>;

    /// `new -> answered`, storing the comment and images.
    fn answer_note_quest(&self, id: QuestId, answer: &NoteAnswer) -> StoreResult<bool>;

    /// `new -> hidden`.
    fn hide_note_quest(&self, id: QuestId) -> StoreResult<bool>;
}

/// Cached copies of map elements.
pub trait ElementStore: Send + Sync {
    fn get_element(&self, key: ElementKey) -> StoreResult<Option<Element>>;

    fn put_element(&self, element: &Element) -> StoreResult<()>;

    /// Remove every element no quest references; returns how many went.
    fn delete_unreferenced_elements(&self) -> StoreResult<usize>;
}

/// Append-only log of structural actions awaiting upload.
pub trait SideRecordLog: Send + Sync {
    fn append_record(&self, record: &SideRecord) -> StoreResult<RecordId>;

    /// All records in append order.
    fn list_records(&self) -> StoreResult<Vec<(RecordId, SideRecord)>>;
}

/// Small persisted settings the workflow writes for the UI.
pub trait QuestPrefs: Send + Sync {
    fn set_last_solved_at(&self, at: DateTime<Utc>) -> StoreResult<()>;

    fn last_solved_at(&self) -> StoreResult<Option<DateTime<Utc>>>;
}

/// Handles to every facade the controller needs.
#[derive(Clone)]
pub struct Stores {
    pub osm_quests: Arc<dyn OsmQuestStore>,
    pub note_quests: Arc<dyn NoteQuestStore>,
    pub elements: Arc<dyn ElementStore>,
    pub records: Arc<dyn SideRecordLog>,
    pub prefs: Arc<dyn QuestPrefs>,
}

impl Stores {
    /// Use one backend for every facade.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: OsmQuestStore + NoteQuestStore + ElementStore + SideRecordLog + QuestPrefs + 'static,
    {
        Self {
            osm_quests: store.clone(),
            note_quests: store.clone(),
            elements: store.clone(),
            records: store.clone(),
            prefs: store,
        }
    }
}
