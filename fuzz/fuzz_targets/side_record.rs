#![no_main]

use libfuzzer_sys::fuzz_target;
use tagquest_core::db::SqliteStore;
use tagquest_core::model::record::SideRecord;
use tagquest_core::store::SideRecordLog;

// Any record that decodes must survive a trip through the database.
fuzz_target!(|data: &[u8]| {
    let Ok(record) = serde_json::from_slice::<SideRecord>(data) else {
        return;
    };
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    let id = store.append_record(&record).expect("append");
    let records = store.list_records().expect("list");
    assert_eq!(records, vec![(id, record)]);
});
