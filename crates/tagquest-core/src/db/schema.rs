//! SQLite schema for the tagquest store.
//!
//! - `elements` caches the tags of map elements quests are about
//! - `osm_quests` and `osm_note_quests` hold the two quest groups with their
//!   lifecycle status and answer payloads
//! - `side_records` is the append-only upload queue
//! - `prefs` holds small key/value settings

/// Migration v1: tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS elements (
    element_kind TEXT NOT NULL CHECK (element_kind IN ('node', 'way', 'relation')),
    element_id INTEGER NOT NULL,
    tags_json TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (element_kind, element_id)
);

CREATE TABLE IF NOT EXISTS osm_quests (
    quest_id INTEGER PRIMARY KEY,
    quest_type TEXT NOT NULL CHECK (length(trim(quest_type)) > 0),
    element_kind TEXT NOT NULL CHECK (element_kind IN ('node', 'way', 'relation')),
    element_id INTEGER NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('new', 'answered', 'hidden', 'closed', 'failed')),
    changes_json TEXT,
    changes_source TEXT,
    last_update_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS osm_note_quests (
    quest_id INTEGER PRIMARY KEY,
    note_id INTEGER NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('new', 'answered', 'hidden', 'closed', 'failed')),
    comment TEXT,
    image_paths_json TEXT NOT NULL DEFAULT '[]',
    last_update_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS side_records (
    record_id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK (kind IN ('create_note', 'delete_element', 'split_way', 'undo_quest')),
    payload_json TEXT NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS prefs (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Migration v2: indexes used by per-element quest queries and listings.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_osm_quests_element_status
    ON osm_quests(element_kind, element_id, status);

CREATE INDEX IF NOT EXISTS idx_osm_quests_status
    ON osm_quests(status, quest_id);

CREATE INDEX IF NOT EXISTS idx_osm_note_quests_status
    ON osm_note_quests(status, quest_id);

CREATE INDEX IF NOT EXISTS idx_side_records_kind
    ON side_records(kind, record_id);
";

/// Indexes expected by store query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_osm_quests_element_status",
    "idx_osm_quests_status",
    "idx_osm_note_quests_status",
    "idx_side_records_kind",
];
