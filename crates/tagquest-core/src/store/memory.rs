use super::{
    ElementStore, NoteQuestStore, OsmQuestStore, QuestPrefs, SideRecordLog, StoreResult,
};
use crate::error::StoreError;
use crate::model::element::{Element, ElementKey};
use crate::model::quest::{NoteAnswer, OsmNoteQuest, OsmQuest, QuestId, QuestStatus};
use crate::model::record::{RecordId, SideRecord};
use crate::tags::TagChanges;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    osm_quests: BTreeMap<QuestId, OsmQuest>,
    note_quests: BTreeMap<QuestId, OsmNoteQuest>,
    elements: BTreeMap<ElementKey, Element>,
    records: Vec<(RecordId, SideRecord)>,
    last_solved_at: Option<DateTime<Utc>>,
}

impl Tables {
    /// Apply `update` to quest `id` if its status is one of `from`.
    fn transition_osm(
        &mut self,
        id: QuestId,
        from: &[QuestStatus],
        update: impl FnOnce(&mut OsmQuest),
    ) -> bool {
        match self.osm_quests.get_mut(&id) {
            Some(quest) if from.contains(&quest.status) => {
                update(quest);
                quest.last_update = Utc::now();
                true
            }
            _ => false,
        }
    }

    fn transition_note(
        &mut self,
        id: QuestId,
        update: impl FnOnce(&mut OsmNoteQuest),
    ) -> bool {
        match self.note_quests.get_mut(&id) {
            Some(quest) if quest.status == QuestStatus::New => {
                update(quest);
                quest.last_update = Utc::now();
                true
            }
            _ => false,
        }
    }
}

/// All facades over one in-process table set.
///
/// One mutex guards every table, so each facade call is atomic with respect
/// to every other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    /// OSM quests ordered by id, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Poisoned`] if a writer panicked.
    pub fn list_osm_quests(&self, status: Option<QuestStatus>) -> StoreResult<Vec<OsmQuest>> {
        Ok(self
            .lock()?
            .osm_quests
            .values()
            .filter(|q| status.is_none_or(|s| q.status == s))
            .cloned()
            .collect())
    }

    /// Note quests ordered by id, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Poisoned`] if a writer panicked.
    pub fn list_note_quests(&self, status: Option<QuestStatus>) -> StoreResult<Vec<OsmNoteQuest>> {
        Ok(self
            .lock()?
            .note_quests
            .values()
            .filter(|q| status.is_none_or(|s| q.status == s))
            .cloned()
            .collect())
    }
}

impl OsmQuestStore for MemoryStore {
    fn get_osm_quest(&self, id: QuestId) -> StoreResult<Option<OsmQuest>> {
        Ok(self.lock()?.osm_quests.get(&id).cloned())
    }

    fn put_osm_quest(&self, quest: &OsmQuest) -> StoreResult<()> {
        self.lock()?.osm_quests.insert(quest.id, quest.clone());
        Ok(())
    }

    fn answer_osm_quest(
        &self,
        id: QuestId,
        changes: &TagChanges,
        source: &str,
    ) -> StoreResult<bool> {
        Ok(self.lock()?.transition_osm(id, &[QuestStatus::New], |q| {
            q.status = QuestStatus::Answered;
            q.changes = Some(changes.clone());
            q.changes_source = Some(source.to_string());
        }))
    }

    fn hide_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        Ok(self.lock()?.transition_osm(id, &[QuestStatus::New], |q| {
            q.status = QuestStatus::Hidden;
        }))
    }

    fn fail_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        Ok(self.lock()?.transition_osm(id, &[QuestStatus::New], |q| {
            q.status = QuestStatus::Failed;
        }))
    }

    fn undo_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        Ok(self.lock()?.transition_osm(
            id,
            &[QuestStatus::Answered, QuestStatus::Hidden],
            reset_to_new,
        ))
    }

    fn revert_uploaded_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        Ok(self
            .lock()?
            .transition_osm(id, &[QuestStatus::Closed], reset_to_new))
    }

    fn close_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        Ok(self.lock()?.transition_osm(id, &[QuestStatus::Answered], |q| {
            q.status = QuestStatus::Closed;
        }))
    }

    fn delete_unsolved_osm_quests_for_element(
        &self,
        element: ElementKey,
        keep: Option<QuestId>,
    ) -> StoreResult<usize> {
        let mut tables = self.lock()?;
        let before = tables.osm_quests.len();
        tables.osm_quests.retain(|id, q| {
            q.element != element || !q.status.is_unsolved() || Some(*id) == keep
        });
        Ok(before - tables.osm_quests.len())
    }

    fn delete_all_osm_quests_for_element(&self, element: ElementKey) -> StoreResult<usize> {
        let mut tables = self.lock()?;
        let before = tables.osm_quests.len();
        tables.osm_quests.retain(|_, q| q.element != element);
        Ok(before - tables.osm_quests.len())
    }

    fn unsolved_quest_types_for_element(
        &self,
        element: ElementKey,
    ) -> StoreResult<BTreeSet<String>> {
        Ok(self
            .lock()?
            .osm_quests
            .values()
            .filter(|q| q.element == element && q.status.is_unsolved())
            .map(|q| q.quest_type.clone())
            .collect())
    }
}

fn reset_to_new(quest: &mut OsmQuest) {
    quest.status = QuestStatus::New;
    quest.changes = None;
    quest.changes_source = None;
}

impl NoteQuestStore for MemoryStore {
    fn get_note_quest(&self, id: QuestId) -> StoreResult<Option<OsmNoteQuest>> {
        Ok(self.lock()?.note_quests.get(&id).cloned())
    }

    fn put_note_quest(&self, quest: &OsmNoteQuest) -> StoreResult<()> {
        self.lock()?.note_quests.insert(quest.id, quest.clone());
        Ok(())
    }

    fn answer_note_quest(&self, id: QuestId, answer: &NoteAnswer) -> StoreResult<bool> {
        Ok(self.lock()?.transition_note(id, |q| {
            q.status = QuestStatus::Answered;
            q.comment = Some(answer.text.clone());
            q.image_paths.clone_from(&answer.image_paths);
        }))
    }

    fn hide_note_quest(&self, id: QuestId) -> StoreResult<bool> {
        Ok(self.lock()?.transition_note(id, |q| {
            q.status = QuestStatus::Hidden;
        }))
    }
}

impl ElementStore for MemoryStore {
    fn get_element(&self, key: ElementKey) -> StoreResult<Option<Element>> {
        Ok(self.lock()?.elements.get(&key).cloned())
    }

    fn put_element(&self, element: &Element) -> StoreResult<()> {
        self.lock()?.elements.insert(element.key, element.clone());
        Ok(())
    }

    fn delete_unreferenced_elements(&self) -> StoreResult<usize> {
        let mut tables = self.lock()?;
        let referenced: BTreeSet<ElementKey> =
            tables.osm_quests.values().map(|q| q.element).collect();
        let before = tables.elements.len();
        tables.elements.retain(|key, _| referenced.contains(key));
        Ok(before - tables.elements.len())
    }
}

impl SideRecordLog for MemoryStore {
    fn append_record(&self, record: &SideRecord) -> StoreResult<RecordId> {
        let mut tables = self.lock()?;
        let id = tables.records.last().map_or(1, |(id, _)| id + 1);
        tables.records.push((id, record.clone()));
        Ok(id)
    }

    fn list_records(&self) -> StoreResult<Vec<(RecordId, SideRecord)>> {
        Ok(self.lock()?.records.clone())
    }
}

impl QuestPrefs for MemoryStore {
    fn set_last_solved_at(&self, at: DateTime<Utc>) -> StoreResult<()> {
        self.lock()?.last_solved_at = Some(at);
        Ok(())
    }

    fn last_solved_at(&self) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.lock()?.last_solved_at)
    }
}
