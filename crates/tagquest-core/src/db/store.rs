use crate::error::StoreError;
use crate::model::element::{Element, ElementKey, ElementKind, LatLon, Tags};
use crate::model::quest::{NoteAnswer, OsmNoteQuest, OsmQuest, QuestId, QuestStatus};
use crate::model::record::{RecordId, SideRecord};
use crate::store::{
    ElementStore, NoteQuestStore, OsmQuestStore, QuestPrefs, SideRecordLog, StoreResult,
};
use crate::tags::TagChanges;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const LAST_SOLVED_AT_KEY: &str = "quests.last_solved_at";

const OSM_QUEST_COLUMNS: &str = "quest_id, quest_type, element_kind, element_id, lat, lon, \
     status, changes_json, changes_source, last_update_us";

const NOTE_QUEST_COLUMNS: &str =
    "quest_id, note_id, lat, lon, status, comment, image_paths_json, last_update_us";

/// All facades backed by one SQLite connection.
///
/// Conditional transitions are single `UPDATE ... WHERE status = ...`
/// statements, so the check and the write cannot interleave with another
/// writer.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// See [`super::open`].
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(super::open(path)?))
    }

    /// # Errors
    ///
    /// See [`super::open_in_memory`].
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(super::open_in_memory()?))
    }

    /// Wrap an already migrated connection.
    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// OSM quests ordered by id, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row does not decode.
    pub fn list_osm_quests(&self, status: Option<QuestStatus>) -> StoreResult<Vec<OsmQuest>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {OSM_QUEST_COLUMNS} FROM osm_quests
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY quest_id"
        ))?;
        let rows = stmt
            .query_map(params![status.map(QuestStatus::as_str)], OsmQuestRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(OsmQuestRow::decode).collect()
    }

    /// Note quests ordered by id, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row does not decode.
    pub fn list_note_quests(&self, status: Option<QuestStatus>) -> StoreResult<Vec<OsmNoteQuest>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_QUEST_COLUMNS} FROM osm_note_quests
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY quest_id"
        ))?;
        let rows = stmt
            .query_map(params![status.map(QuestStatus::as_str)], NoteQuestRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(NoteQuestRow::decode).collect()
    }

    fn set_osm_status(
        &self,
        id: QuestId,
        from: &[QuestStatus],
        to: QuestStatus,
        clear_changes: bool,
    ) -> StoreResult<bool> {
        let from = from
            .iter()
            .map(|status| format!("'{}'", status.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let updated = self.lock()?.execute(
            &format!(
                "UPDATE osm_quests
                 SET status = ?2,
                     changes_json = CASE WHEN ?3 THEN NULL ELSE changes_json END,
                     changes_source = CASE WHEN ?3 THEN NULL ELSE changes_source END,
                     last_update_us = ?4
                 WHERE quest_id = ?1 AND status IN ({from})"
            ),
            params![id, to.as_str(), clear_changes, now_us()],
        )?;
        Ok(updated == 1)
    }
}

fn now_us() -> i64 {
    Utc::now().timestamp_micros()
}

fn from_us(us: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(us)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {us}")))
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

struct OsmQuestRow {
    id: QuestId,
    quest_type: String,
    element_kind: String,
    element_id: i64,
    lat: f64,
    lon: f64,
    status: String,
    changes_json: Option<String>,
    changes_source: Option<String>,
    last_update_us: i64,
}

impl OsmQuestRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            quest_type: row.get(1)?,
            element_kind: row.get(2)?,
            element_id: row.get(3)?,
            lat: row.get(4)?,
            lon: row.get(5)?,
            status: row.get(6)?,
            changes_json: row.get(7)?,
            changes_source: row.get(8)?,
            last_update_us: row.get(9)?,
        })
    }

    fn decode(self) -> StoreResult<OsmQuest> {
        let kind: ElementKind = self.element_kind.parse().map_err(corrupt)?;
        let changes = self
            .changes_json
            .as_deref()
            .map(serde_json::from_str::<TagChanges>)
            .transpose()?;
        Ok(OsmQuest {
            id: self.id,
            quest_type: self.quest_type,
            element: ElementKey::new(kind, self.element_id),
            center: LatLon::new(self.lat, self.lon),
            status: self.status.parse().map_err(corrupt)?,
            changes,
            changes_source: self.changes_source,
            last_update: from_us(self.last_update_us)?,
        })
    }
}

struct NoteQuestRow {
    id: QuestId,
    note_id: i64,
    lat: f64,
    lon: f64,
    status: String,
    comment: Option<String>,
    image_paths_json: String,
    last_update_us: i64,
}

impl NoteQuestRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            note_id: row.get(1)?,
            lat: row.get(2)?,
            lon: row.get(3)?,
            status: row.get(4)?,
            comment: row.get(5)?,
            image_paths_json: row.get(6)?,
            last_update_us: row.get(7)?,
        })
    }

    fn decode(self) -> StoreResult<OsmNoteQuest> {
        Ok(OsmNoteQuest {
            id: self.id,
            note_id: self.note_id,
            center: LatLon::new(self.lat, self.lon),
            status: self.status.parse().map_err(corrupt)?,
            comment: self.comment,
            image_paths: serde_json::from_str(&self.image_paths_json)?,
            last_update: from_us(self.last_update_us)?,
        })
    }
}

impl OsmQuestStore for SqliteStore {
    fn get_osm_quest(&self, id: QuestId) -> StoreResult<Option<OsmQuest>> {
        let row = self
            .lock()?
            .query_row(
                &format!("SELECT {OSM_QUEST_COLUMNS} FROM osm_quests WHERE quest_id = ?1"),
                params![id],
                OsmQuestRow::read,
            )
            .optional()?;
        row.map(OsmQuestRow::decode).transpose()
    }

    fn put_osm_quest(&self, quest: &OsmQuest) -> StoreResult<()> {
        let changes_json = quest
            .changes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO osm_quests (
                quest_id, quest_type, element_kind, element_id, lat, lon,
                status, changes_json, changes_source, last_update_us
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                quest.id,
                quest.quest_type,
                quest.element.kind.as_str(),
                quest.element.id,
                quest.center.lat,
                quest.center.lon,
                quest.status.as_str(),
                changes_json,
                quest.changes_source,
                quest.last_update.timestamp_micros(),
            ],
        )?;
        Ok(())
    }

    fn answer_osm_quest(
        &self,
        id: QuestId,
        changes: &TagChanges,
        source: &str,
    ) -> StoreResult<bool> {
        let changes_json = serde_json::to_string(changes)?;
        let updated = self.lock()?.execute(
            "UPDATE osm_quests
             SET status = 'answered', changes_json = ?2, changes_source = ?3,
                 last_update_us = ?4
             WHERE quest_id = ?1 AND status = 'new'",
            params![id, changes_json, source, now_us()],
        )?;
        Ok(updated == 1)
    }

    fn hide_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        self.set_osm_status(id, &[QuestStatus::New], QuestStatus::Hidden, false)
    }

    fn fail_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        self.set_osm_status(id, &[QuestStatus::New], QuestStatus::Failed, false)
    }

    fn undo_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        self.set_osm_status(
            id,
            &[QuestStatus::Answered, QuestStatus::Hidden],
            QuestStatus::New,
            true,
        )
    }

    fn revert_uploaded_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        self.set_osm_status(id, &[QuestStatus::Closed], QuestStatus::New, true)
    }

    fn close_osm_quest(&self, id: QuestId) -> StoreResult<bool> {
        self.set_osm_status(id, &[QuestStatus::Answered], QuestStatus::Closed, false)
    }

    fn delete_unsolved_osm_quests_for_element(
        &self,
        element: ElementKey,
        keep: Option<QuestId>,
    ) -> StoreResult<usize> {
        Ok(self.lock()?.execute(
            "DELETE FROM osm_quests
             WHERE element_kind = ?1 AND element_id = ?2
               AND status IN ('new', 'hidden')
               AND quest_id IS NOT ?3",
            params![element.kind.as_str(), element.id, keep],
        )?)
    }

    fn delete_all_osm_quests_for_element(&self, element: ElementKey) -> StoreResult<usize> {
        Ok(self.lock()?.execute(
            "DELETE FROM osm_quests WHERE element_kind = ?1 AND element_id = ?2",
            params![element.kind.as_str(), element.id],
        )?)
    }

    fn unsolved_quest_types_for_element(
        &self,
        element: ElementKey,
    ) -> StoreResult<BTreeSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT quest_type FROM osm_quests
             WHERE element_kind = ?1 AND element_id = ?2
               AND status IN ('new', 'hidden')",
        )?;
        let types = stmt
            .query_map(params![element.kind.as_str(), element.id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(types)
    }
}

impl NoteQuestStore for SqliteStore {
    fn get_note_quest(&self, id: QuestId) -> StoreResult<Option<OsmNoteQuest>> {
        let row = self
            .lock()?
            .query_row(
                &format!("SELECT {NOTE_QUEST_COLUMNS} FROM osm_note_quests WHERE quest_id = ?1"),
                params![id],
                NoteQuestRow::read,
            )
            .optional()?;
        row.map(NoteQuestRow::decode).transpose()
    }

    fn put_note_quest(&self, quest: &OsmNoteQuest) -> StoreResult<()> {
        let image_paths_json = serde_json::to_string(&quest.image_paths)?;
        self.lock()?.execute(
            "INSERT OR REPLACE INTO osm_note_quests (
                quest_id, note_id, lat, lon, status, comment,
                image_paths_json, last_update_us
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                quest.id,
                quest.note_id,
                quest.center.lat,
                quest.center.lon,
                quest.status.as_str(),
                quest.comment,
                image_paths_json,
                quest.last_update.timestamp_micros(),
            ],
        )?;
        Ok(())
    }

    fn answer_note_quest(&self, id: QuestId, answer: &NoteAnswer) -> StoreResult<bool> {
        let image_paths_json = serde_json::to_string(&answer.image_paths)?;
        let updated = self.lock()?.execute(
            "UPDATE osm_note_quests
             SET status = 'answered', comment = ?2, image_paths_json = ?3,
                 last_update_us = ?4
             WHERE quest_id = ?1 AND status = 'new'",
            params![id, answer.text, image_paths_json, now_us()],
        )?;
        Ok(updated == 1)
    }

    fn hide_note_quest(&self, id: QuestId) -> StoreResult<bool> {
        let updated = self.lock()?.execute(
            "UPDATE osm_note_quests
             SET status = 'hidden', last_update_us = ?2
             WHERE quest_id = ?1 AND status = 'new'",
            params![id, now_us()],
        )?;
        Ok(updated == 1)
    }
}

impl ElementStore for SqliteStore {
    fn get_element(&self, key: ElementKey) -> StoreResult<Option<Element>> {
        let tags_json: Option<String> = self
            .lock()?
            .query_row(
                "SELECT tags_json FROM elements WHERE element_kind = ?1 AND element_id = ?2",
                params![key.kind.as_str(), key.id],
                |row| row.get(0),
            )
            .optional()?;
        tags_json
            .map(|json| -> StoreResult<Element> {
                Ok(Element::new(key, serde_json::from_str::<Tags>(&json)?))
            })
            .transpose()
    }

    fn put_element(&self, element: &Element) -> StoreResult<()> {
        let tags_json = serde_json::to_string(&element.tags)?;
        self.lock()?.execute(
            "INSERT INTO elements (element_kind, element_id, tags_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(element_kind, element_id) DO UPDATE SET tags_json = excluded.tags_json",
            params![element.key.kind.as_str(), element.key.id, tags_json],
        )?;
        Ok(())
    }

    fn delete_unreferenced_elements(&self) -> StoreResult<usize> {
        Ok(self.lock()?.execute(
            "DELETE FROM elements
             WHERE NOT EXISTS (
                SELECT 1 FROM osm_quests q
                WHERE q.element_kind = elements.element_kind
                  AND q.element_id = elements.element_id
             )",
            [],
        )?)
    }
}

impl SideRecordLog for SqliteStore {
    fn append_record(&self, record: &SideRecord) -> StoreResult<RecordId> {
        let payload_json = serde_json::to_string(record)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO side_records (kind, payload_json, created_at_us) VALUES (?1, ?2, ?3)",
            params![record.kind().as_str(), payload_json, now_us()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_records(&self) -> StoreResult<Vec<(RecordId, SideRecord)>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT record_id, payload_json FROM side_records ORDER BY record_id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|(id, json)| -> StoreResult<(RecordId, SideRecord)> {
                Ok((id, serde_json::from_str(&json)?))
            })
            .collect()
    }
}

impl QuestPrefs for SqliteStore {
    fn set_last_solved_at(&self, at: DateTime<Utc>) -> StoreResult<()> {
        self.lock()?.execute(
            "INSERT INTO prefs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LAST_SOLVED_AT_KEY, at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn last_solved_at(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let value: Option<String> = self
            .lock()?
            .query_row(
                "SELECT value FROM prefs WHERE key = ?1",
                params![LAST_SOLVED_AT_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|v| {
                DateTime::parse_from_rfc3339(&v)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(corrupt)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::model::element::{Element, ElementKey, LatLon, Tags};
    use crate::model::quest::{NoteAnswer, OsmNoteQuest, OsmQuest, QuestStatus};
    use crate::model::record::{CreateNote, SideRecord, SideRecordKind};
    use crate::store::{ElementStore, NoteQuestStore, OsmQuestStore, QuestPrefs, SideRecordLog};
    use crate::tags::{TagChange, TagChanges};
    use chrono::{TimeZone, Utc};

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("open in-memory store")
    }

    fn quest(id: i64, quest_type: &str, element: ElementKey) -> OsmQuest {
        OsmQuest::new(id, quest_type, element, LatLon::new(52.5, 13.4))
    }

    fn parking_change() -> TagChanges {
        TagChanges::new(vec![TagChange::Add {
            key: "parking".into(),
            value: "surface".into(),
        }])
        .expect("single change")
    }

    #[test]
    fn osm_quest_survives_round_trip_with_changes() {
        let store = store();
        store
            .put_osm_quest(&quest(42, "AddParkingType", ElementKey::way(7)))
            .unwrap();
        assert!(store.answer_osm_quest(42, &parking_change(), "survey").unwrap());

        let loaded = store.get_osm_quest(42).unwrap().expect("quest stored");
        assert_eq!(loaded.status, QuestStatus::Answered);
        assert_eq!(loaded.element, ElementKey::way(7));
        assert_eq!(loaded.changes, Some(parking_change()));
        assert_eq!(loaded.changes_source.as_deref(), Some("survey"));
        assert!(store.get_osm_quest(43).unwrap().is_none());
    }

    #[test]
    fn transitions_are_conditional_on_status() {
        let store = store();
        store.put_osm_quest(&quest(1, "A", ElementKey::node(1))).unwrap();

        assert!(!store.close_osm_quest(1).unwrap());
        assert!(store.answer_osm_quest(1, &parking_change(), "survey").unwrap());
        assert!(!store.answer_osm_quest(1, &parking_change(), "survey").unwrap());
        assert!(!store.hide_osm_quest(1).unwrap());
        assert!(store.close_osm_quest(1).unwrap());
        assert!(!store.undo_osm_quest(1).unwrap());
        assert!(store.revert_uploaded_osm_quest(1).unwrap());

        let loaded = store.get_osm_quest(1).unwrap().unwrap();
        assert_eq!(loaded.status, QuestStatus::New);
        assert!(loaded.changes.is_none());
        assert!(loaded.changes_source.is_none());
    }

    #[test]
    fn unsolved_queries_cover_new_and_hidden() {
        let store = store();
        let way = ElementKey::way(9);
        store.put_osm_quest(&quest(1, "A", way)).unwrap();
        store.put_osm_quest(&quest(2, "B", way)).unwrap();
        store.put_osm_quest(&quest(3, "C", way)).unwrap();
        store.hide_osm_quest(2).unwrap();
        store.answer_osm_quest(3, &parking_change(), "survey").unwrap();

        let types = store.unsolved_quest_types_for_element(way).unwrap();
        assert_eq!(
            types.into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );

        assert_eq!(
            store.delete_unsolved_osm_quests_for_element(way, None).unwrap(),
            2
        );
        assert!(store.get_osm_quest(3).unwrap().is_some());
        assert_eq!(store.delete_all_osm_quests_for_element(way).unwrap(), 1);
    }

    #[test]
    fn elements_are_upserted_and_purged_when_unreferenced() {
        let store = store();
        let key = ElementKey::node(3);
        let mut tags = Tags::new();
        tags.insert("amenity".into(), "bench".into());
        store.put_element(&Element::new(key, Tags::new())).unwrap();
        store.put_element(&Element::new(key, tags.clone())).unwrap();
        assert_eq!(store.get_element(key).unwrap().unwrap().tags, tags);

        store.put_osm_quest(&quest(5, "A", key)).unwrap();
        assert_eq!(store.delete_unreferenced_elements().unwrap(), 0);
        store.delete_all_osm_quests_for_element(key).unwrap();
        assert_eq!(store.delete_unreferenced_elements().unwrap(), 1);
        assert!(store.get_element(key).unwrap().is_none());
    }

    #[test]
    fn note_quests_answer_once() {
        let store = store();
        store
            .put_note_quest(&OsmNoteQuest::new(8, 1001, LatLon::new(1.0, 2.0)))
            .unwrap();
        let mut answer = NoteAnswer::new("still there");
        answer.image_paths.push("/tmp/a.jpg".into());

        assert!(store.answer_note_quest(8, &answer).unwrap());
        assert!(!store.hide_note_quest(8).unwrap());
        let loaded = store.get_note_quest(8).unwrap().unwrap();
        assert_eq!(loaded.status, QuestStatus::Answered);
        assert_eq!(loaded.comment.as_deref(), Some("still there"));
        assert_eq!(loaded.image_paths, vec!["/tmp/a.jpg".to_string()]);
        assert_eq!(store.list_note_quests(Some(QuestStatus::New)).unwrap().len(), 0);
    }

    #[test]
    fn records_keep_append_order() {
        let store = store();
        let first = SideRecord::CreateNote(CreateNote {
            text: "gone".into(),
            position: LatLon::new(0.0, 0.0),
            quest_title: None,
            element: None,
            image_paths: Vec::new(),
        });
        let a = store.append_record(&first).unwrap();
        let b = store.append_record(&first).unwrap();
        assert!(b > a);

        let records = store.list_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, a);
        assert_eq!(records[1].1.kind(), SideRecordKind::CreateNote);
    }

    #[test]
    fn last_solved_at_round_trips() {
        let store = store();
        assert!(store.last_solved_at().unwrap().is_none());
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        store.set_last_solved_at(at).unwrap();
        assert_eq!(store.last_solved_at().unwrap(), Some(at));
    }

    #[test]
    fn listing_filters_by_status() {
        let store = store();
        store.put_osm_quest(&quest(2, "A", ElementKey::node(1))).unwrap();
        store.put_osm_quest(&quest(1, "B", ElementKey::node(2))).unwrap();
        store.hide_osm_quest(2).unwrap();

        let all = store.list_osm_quests(None).unwrap();
        assert_eq!(all.iter().map(|q| q.id).collect::<Vec<_>>(), vec![1, 2]);
        let hidden = store.list_osm_quests(Some(QuestStatus::Hidden)).unwrap();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].id, 2);
    }
}
