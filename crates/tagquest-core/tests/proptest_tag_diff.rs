use proptest::prelude::*;
use tagquest_core::model::element::Tags;
use tagquest_core::tags::{ProtectedKeys, TagChange, replacement_changes};

#[path = "generators.rs"]
mod generators;
use generators::*;

fn expected_replacement(previous: &Tags, new: &Tags, protected: &ProtectedKeys) -> Tags {
    let mut expected = new.clone();
    for (key, value) in previous {
        if !new.contains_key(key) && protected.is_protected(key) {
            expected.insert(key.clone(), value.clone());
        }
    }
    expected
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    #[test]
    fn replacement_reaches_new_plus_protected_leftovers(
        previous in arb_tags(),
        new in arb_tags(),
    ) {
        let protected = ProtectedKeys::default();
        let changes = replacement_changes(&previous, &new, &protected);

        let mut applied = previous.clone();
        prop_assert!(changes.apply_to(&mut applied).is_ok());
        prop_assert_eq!(applied, expected_replacement(&previous, &new, &protected));
    }

    #[test]
    fn replacement_touches_each_key_at_most_once(
        previous in arb_tags(),
        new in arb_tags(),
    ) {
        let protected = ProtectedKeys::default();
        let changes = replacement_changes(&previous, &new, &protected);

        for (key, value) in &previous {
            let ops: Vec<TagChange> = changes.iter().filter(|c| c.key() == key).cloned().collect();
            match new.get(key) {
                None if protected.is_protected(key) => prop_assert!(ops.is_empty()),
                None => prop_assert_eq!(
                    ops,
                    vec![TagChange::Delete { key: key.clone(), value_before: value.clone() }]
                ),
                Some(target) if target == value => prop_assert!(ops.is_empty()),
                Some(target) => prop_assert_eq!(
                    ops,
                    vec![TagChange::Modify {
                        key: key.clone(),
                        value_before: value.clone(),
                        value: target.clone(),
                    }]
                ),
            }
        }
        for (key, value) in &new {
            if !previous.contains_key(key) {
                let ops: Vec<TagChange> = changes.iter().filter(|c| c.key() == key).cloned().collect();
                prop_assert_eq!(
                    ops,
                    vec![TagChange::Add { key: key.clone(), value: value.clone() }]
                );
            }
        }
    }

    #[test]
    fn deletions_precede_additions(previous in arb_tags(), new in arb_tags()) {
        let changes = replacement_changes(&previous, &new, &ProtectedKeys::default());
        let first_non_delete = changes
            .iter()
            .position(|c| !matches!(c, TagChange::Delete { .. }))
            .unwrap_or(changes.len());
        let no_delete_after_first_non_delete = changes.as_slice()[first_non_delete..]
            .iter()
            .all(|c| !matches!(c, TagChange::Delete { .. }));
        prop_assert!(no_delete_after_first_non_delete);
    }

    #[test]
    fn diffing_the_result_again_is_empty(previous in arb_tags(), new in arb_tags()) {
        let protected = ProtectedKeys::default();
        let changes = replacement_changes(&previous, &new, &protected);
        let mut applied = previous.clone();
        changes.apply_to(&mut applied).expect("diff applies to its source");

        prop_assert!(replacement_changes(&applied, &new, &protected).is_empty());
    }

    #[test]
    fn reversed_diff_restores_previous(previous in arb_tags(), new in arb_tags()) {
        let changes = replacement_changes(&previous, &new, &ProtectedKeys::default());
        let mut tags = previous.clone();
        changes.apply_to(&mut tags).expect("diff applies to its source");
        changes.reversed().apply_to(&mut tags).expect("reverse applies to the result");
        prop_assert_eq!(tags, previous);
    }

    #[test]
    fn stale_premise_is_rejected_without_partial_writes(
        previous in arb_tags(),
        new in arb_tags(),
        intruder in arb_value(),
    ) {
        let changes = replacement_changes(&previous, &new, &ProtectedKeys::default());
        prop_assume!(!changes.is_empty());

        // invalidate the premise of the last change only
        let mut drifted = previous.clone();
        let last = &changes.as_slice()[changes.len() - 1];
        match last {
            TagChange::Add { key, .. } => {
                drifted.insert(key.clone(), intruder);
            }
            TagChange::Modify { key, .. } | TagChange::Delete { key, .. } => {
                drifted.remove(key);
            }
        }

        let before = drifted.clone();
        prop_assert!(changes.apply_to(&mut drifted).is_err());
        prop_assert_eq!(drifted, before);
    }
}
