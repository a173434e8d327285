#![no_main]

use libfuzzer_sys::fuzz_target;
use tagquest_core::model::element::Tags;
use tagquest_core::tags::{ProtectedKeys, replacement_changes};

/// `key=value` lines; a blank line separates the old tags from the new.
fn split_tag_sets(text: &str) -> (Tags, Tags) {
    let (old, new) = text.split_once("\n\n").unwrap_or((text, ""));
    let parse = |block: &str| {
        block
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Tags>()
    };
    (parse(old), parse(new))
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (previous, new) = split_tag_sets(text);
    let protected = ProtectedKeys::default();

    let changes = replacement_changes(&previous, &new, &protected);
    let mut applied = previous.clone();
    changes
        .apply_to(&mut applied)
        .expect("replacement diff must apply to its source");

    for (key, value) in &new {
        assert_eq!(applied.get(key), Some(value));
    }
    assert!(replacement_changes(&applied, &new, &protected).is_empty());
});
