//! Values stored in a [`ParamMap`](super::ParamMap) and their typed views.

use super::{ParamMap, RelativeFileSet};
use std::{collections::BTreeMap, path::PathBuf};

/// A value held under a parameter key.
///
/// `Raw` is an unconverted string supplied by the user (command line, config
/// file); the first resolution of the key parses it into a typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Explicitly null. Resolves to `None` without consulting the default.
    Null,
    /// User supplied, not yet parsed.
    Raw(String),
    /// Text value.
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Filesystem path.
    Path(PathBuf),
    /// List of strings.
    List(Vec<String>),
    /// Ordered string map (JVM properties, user JVM options).
    Map(BTreeMap<String, String>),
    /// Base directory plus relative files.
    Files(RelativeFileSet),
    /// Several file sets.
    FileSets(Vec<RelativeFileSet>),
    /// Nested parameter maps (secondary launchers, file associations).
    Maps(Vec<ParamMap>),
}

impl ParamValue {
    /// Short type label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Raw(_) => "raw string",
            ParamValue::Text(_) => "text",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) => "integer",
            ParamValue::Path(_) => "path",
            ParamValue::List(_) => "list",
            ParamValue::Map(_) => "map",
            ParamValue::Files(_) => "file set",
            ParamValue::FileSets(_) => "file set list",
            ParamValue::Maps(_) => "map list",
        }
    }
}

/// A Rust type that can be stored in and read back from a [`ParamValue`].
pub trait ParamType: Clone {
    /// Type label used in error messages.
    const KIND: &'static str;

    /// Extracts a typed value, `None` when the variant does not match.
    fn from_value(value: &ParamValue) -> Option<Self>;

    /// Wraps the typed value for storage.
    fn into_value(self) -> ParamValue;
}

macro_rules! param_type {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl ParamType for $ty {
            const KIND: &'static str = $kind;

            fn from_value(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> ParamValue {
                ParamValue::$variant(self)
            }
        }
    };
}

param_type!(bool, Bool, "boolean");
param_type!(i64, Int, "integer");
param_type!(PathBuf, Path, "path");
param_type!(Vec<String>, List, "list");
param_type!(BTreeMap<String, String>, Map, "map");
param_type!(RelativeFileSet, Files, "file set");
param_type!(Vec<RelativeFileSet>, FileSets, "file set list");
param_type!(Vec<ParamMap>, Maps, "map list");

// Text accepts unparsed strings so parameters without a parser still read
// user input verbatim.
impl ParamType for String {
    const KIND: &'static str = "text";

    fn from_value(value: &ParamValue) -> Option<Self> {
        match value {
            ParamValue::Text(v) | ParamValue::Raw(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> ParamValue {
        ParamValue::Text(self)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Raw(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Raw(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(list: Vec<String>) -> Self {
        ParamValue::List(list)
    }
}

impl From<PathBuf> for ParamValue {
    fn from(p: PathBuf) -> Self {
        ParamValue::Path(p)
    }
}

impl From<RelativeFileSet> for ParamValue {
    fn from(f: RelativeFileSet) -> Self {
        ParamValue::Files(f)
    }
}

impl From<Vec<ParamMap>> for ParamValue {
    fn from(maps: Vec<ParamMap>) -> Self {
        ParamValue::Maps(maps)
    }
}
