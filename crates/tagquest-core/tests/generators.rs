use proptest::prelude::*;
use tagquest_core::model::element::Tags;

/// Keys that collide often between tag sets, half of them protected.
const COMMON_KEYS: &[&str] = &[
    "shop",
    "amenity",
    "name",
    "opening_hours",
    "website",
    "addr:street",
    "addr:housenumber",
    "building",
    "level",
    "roof:shape",
    "fixme",
    "note",
];

pub fn arb_key() -> impl Strategy<Value = String> + Clone {
    prop_oneof![
        3 => prop::sample::select(COMMON_KEYS).prop_map(str::to_string),
        1 => "[a-z]{1,6}(:[a-z]{1,4})?",
    ]
}

pub fn arb_value() -> impl Strategy<Value = String> + Clone {
    prop_oneof![
        Just("yes".to_string()),
        Just("no".to_string()),
        "[a-z0-9 ]{1,8}",
    ]
}

pub fn arb_tags() -> impl Strategy<Value = Tags> + Clone {
    prop::collection::btree_map(arb_key(), arb_value(), 0..10)
}
