use super::changes::{TagChange, TagChanges};
use crate::model::element::Tags;
use regex::Regex;

/// Keys describing the physical feature rather than the business occupying
/// it. Replacing a shop or amenity keeps them even when the new tag set
/// does not mention them. Each entry is a full-match regex.
pub const DEFAULT_PROTECTED_KEYS: &[&str] = &[
    "landuse",
    "historic",
    // building and simple 3d building mapping
    "building",
    "man_made",
    "building:.*",
    "roof:.*",
    // any address
    "addr:.*",
    // a shop can at the same time be an outline in indoor mapping
    "level",
    "level:ref",
    "indoor",
    "room",
    // geometry
    "layer",
    "ele",
    "height",
    "area",
    "is_in",
    // notes and fixmes
    "FIXME",
    "fixme",
    "note",
];

/// Compiled set of protected key patterns.
#[derive(Debug, Clone)]
pub struct ProtectedKeys {
    patterns: Vec<Regex>,
}

impl ProtectedKeys {
    /// Built-in patterns plus `extra` ones.
    ///
    /// # Errors
    ///
    /// Returns the regex error of the first pattern that fails to compile.
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Result<Self, regex::Error> {
        let patterns = DEFAULT_PROTECTED_KEYS
            .iter()
            .copied()
            .chain(extra.iter().map(AsRef::as_ref))
            .map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn is_protected(&self, key: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(key))
    }
}

impl Default for ProtectedKeys {
    fn default() -> Self {
        let patterns = DEFAULT_PROTECTED_KEYS
            .iter()
            .filter_map(|pattern| Regex::new(&format!("^(?:{pattern})$")).ok())
            .collect();
        Self { patterns }
    }
}

/// Changes that turn `previous` into `new`, keeping protected keys.
///
/// Deletions come first (in `previous` order), then additions and
/// modifications (in `new` order). Keys whose value is unchanged produce
/// nothing, so identical inputs give an empty list.
#[must_use]
pub fn replacement_changes(previous: &Tags, new: &Tags, protected: &ProtectedKeys) -> TagChanges {
    let mut changes = Vec::new();

    for (key, value) in previous {
        if !new.contains_key(key) && !protected.is_protected(key) {
            changes.push(TagChange::Delete {
                key: key.clone(),
                value_before: value.clone(),
            });
        }
    }

    for (key, value) in new {
        match previous.get(key) {
            Some(before) if before == value => {}
            Some(before) => changes.push(TagChange::Modify {
                key: key.clone(),
                value_before: before.clone(),
                value: value.clone(),
            }),
            None => changes.push(TagChange::Add {
                key: key.clone(),
                value: value.clone(),
            }),
        }
    }

    // deleted keys are absent from `new`, so every key appears once
    TagChanges::new(changes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{ProtectedKeys, replacement_changes};
    use crate::model::element::Tags;
    use crate::tags::TagChange;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn builtin_patterns_match_whole_keys() {
        let protected = ProtectedKeys::default();
        assert!(protected.is_protected("addr:street"));
        assert!(protected.is_protected("building"));
        assert!(protected.is_protected("roof:shape"));
        assert!(protected.is_protected("level"));
        assert!(protected.is_protected("FIXME"));
        assert!(!protected.is_protected("levels"));
        assert!(!protected.is_protected("shop"));
        assert!(!protected.is_protected("name:addr"));
    }

    #[test]
    fn bakery_replaced_by_butcher_keeps_address_and_level() {
        let previous = tags(&[
            ("shop", "bakery"),
            ("addr:street", "Main St"),
            ("level", "0"),
        ]);
        let new = tags(&[("shop", "butcher")]);
        let changes = replacement_changes(&previous, &new, &ProtectedKeys::default());
        assert_eq!(
            changes.as_slice(),
            &[TagChange::Modify {
                key: "shop".into(),
                value_before: "bakery".into(),
                value: "butcher".into(),
            }]
        );
    }

    #[test]
    fn unprotected_leftovers_are_deleted_before_additions() {
        let previous = tags(&[("shop", "bakery"), ("opening_hours", "Mo-Fr 08:00-18:00")]);
        let new = tags(&[("amenity", "cafe"), ("name", "Corner")]);
        let changes = replacement_changes(&previous, &new, &ProtectedKeys::default());
        let ops: Vec<_> = changes.iter().map(ToString::to_string).collect();
        assert_eq!(
            ops,
            vec![
                "DELETE \"opening_hours\"=\"Mo-Fr 08:00-18:00\"",
                "DELETE \"shop\"=\"bakery\"",
                "ADD \"amenity\"=\"cafe\"",
                "ADD \"name\"=\"Corner\"",
            ]
        );
    }

    #[test]
    fn extra_patterns_extend_builtin_set() {
        let protected = ProtectedKeys::with_extra(&["check_date(:.*)?"]).unwrap();
        assert!(protected.is_protected("check_date"));
        assert!(protected.is_protected("check_date:opening_hours"));
        assert!(protected.is_protected("addr:city"));
        assert!(ProtectedKeys::with_extra(&["("]).is_err());
    }

    #[test]
    fn identical_inputs_give_empty_diff() {
        let previous = tags(&[("shop", "bakery")]);
        assert!(replacement_changes(&previous, &previous, &ProtectedKeys::default()).is_empty());
    }
}
