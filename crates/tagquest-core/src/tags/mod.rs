//! Tag-diff engine.
//!
//! Pure computation of minimal key/value change lists between an element's
//! current tags and a desired outcome. Two policies exist:
//!
//! - the *answer* policy, where a quest type records changes on a
//!   [`TagChangesBuilder`] seeded with the current tags and may report a
//!   conflict when those tags no longer fit the question;
//! - the *replacement* policy ([`replacement_changes`]), used when a shop or
//!   amenity is replaced wholesale while physical-feature keys survive.

mod builder;
mod changes;
mod replace;

pub use builder::TagChangesBuilder;
pub use changes::{TagChange, TagChangeError, TagChanges};
pub use replace::{DEFAULT_PROTECTED_KEYS, ProtectedKeys, replacement_changes};
