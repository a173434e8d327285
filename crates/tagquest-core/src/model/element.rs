use super::{ParseEnumError, normalize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

/// Tag mapping of a map element. Keys are unique; order carries no meaning.
pub type Tags = BTreeMap<String, String>;

/// The three kinds of map element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "node" => Ok(Self::Node),
            "way" => Ok(Self::Way),
            "relation" => Ok(Self::Relation),
            _ => Err(ParseEnumError {
                expected: "element kind",
                got: s.to_string(),
            }),
        }
    }
}

/// Identity of a cached element: `(kind, id)`, rendered as `way/7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey {
    pub kind: ElementKind,
    pub id: i64,
}

impl ElementKey {
    #[must_use]
    pub const fn new(kind: ElementKind, id: i64) -> Self {
        Self { kind, id }
    }

    #[must_use]
    pub const fn node(id: i64) -> Self {
        Self::new(ElementKind::Node, id)
    }

    #[must_use]
    pub const fn way(id: i64) -> Self {
        Self::new(ElementKind::Way, id)
    }

    #[must_use]
    pub const fn relation(id: i64) -> Self {
        Self::new(ElementKind::Relation, id)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl FromStr for ElementKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEnumError {
            expected: "element key",
            got: s.to_string(),
        };
        let (kind, id) = s.trim().split_once('/').ok_or_else(err)?;
        let kind = kind.parse::<ElementKind>().map_err(|_| err())?;
        let id = id.parse::<i64>().map_err(|_| err())?;
        Ok(Self { kind, id })
    }
}

/// A geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for LatLon {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEnumError {
            expected: "lat,lon position",
            got: s.to_string(),
        };
        let (lat, lon) = s.trim().split_once(',').ok_or_else(err)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| err())?;
        let lon = lon.trim().parse::<f64>().map_err(|_| err())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(err());
        }
        Ok(Self { lat, lon })
    }
}

/// Cached copy of a map element, shared by every quest that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub key: ElementKey,
    #[serde(default)]
    pub tags: Tags,
}

impl Element {
    #[must_use]
    pub const fn new(key: ElementKey, tags: Tags) -> Self {
        Self { key, tags }
    }
}
