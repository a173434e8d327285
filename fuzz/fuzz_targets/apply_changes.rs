#![no_main]

use libfuzzer_sys::fuzz_target;
use tagquest_core::model::element::Tags;
use tagquest_core::tags::TagChanges;

// Input: a JSON object `{"tags": {...}, "changes": [...]}`. Applying must
// either succeed and be reversible, or fail without touching the tags.
fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(tags) = serde_json::from_value::<Tags>(value["tags"].clone()) else {
        return;
    };
    let Ok(changes) = serde_json::from_value::<TagChanges>(value["changes"].clone()) else {
        return;
    };

    let mut applied = tags.clone();
    match changes.apply_to(&mut applied) {
        Ok(()) => {
            changes
                .reversed()
                .apply_to(&mut applied)
                .expect("reverse of an applied diff must apply");
            assert_eq!(applied, tags);
        }
        Err(_) => assert_eq!(applied, tags),
    }
});
