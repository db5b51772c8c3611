//! Parameter registry: typed, derivable configuration entries.
//!
//! A [`BundlerParam`] names a key in a [`ParamMap`], declares the value type,
//! how to derive a default from the rest of the map, and how to parse a
//! user-supplied string. Resolution is on demand and memoized into the map:
//!
//! 1. an explicit null resolves to `None`;
//! 2. a raw user string is parsed, stored back and returned (a parser may
//!    turn it into an explicit null);
//! 3. an already typed value is returned as is;
//! 4. otherwise the default function runs and a non-null result is stored.
//!
//! Default functions read other keys through their own resolvers, which makes
//! the registry a demand-driven attribute graph. The map records which keys
//! are mid-resolution; re-entering one fails with
//! [`Error::ResolutionCycle`] instead of recursing forever.
//!
//! # Examples
//!
//! ```
//! use app_packager::bundler::params::{ParamMap, standard};
//!
//! # fn example() -> app_packager::bundler::Result<()> {
//! let mut params = ParamMap::new();
//! params.insert("applicationClass", "com.example.hello.Main");
//!
//! // name derives from the main class, identifier from its package
//! assert_eq!(standard::APP_NAME.require(&mut params)?, "Main");
//! assert_eq!(standard::IDENTIFIER.require(&mut params)?, "com.example.hello");
//! # Ok(())
//! # }
//! ```

mod files;
pub mod parse;
pub mod standard;
mod value;

pub use files::RelativeFileSet;
pub use value::{ParamType, ParamValue};

use crate::bundler::error::{Error, Result};
use std::{collections::HashMap, fmt, marker::PhantomData};

/// Default-value supplier: derives a value from the rest of the map.
pub type DefaultFn<T> = fn(&mut ParamMap) -> Result<Option<T>>;

/// Parser for a user-supplied string. `Ok(None)` stores an explicit null.
pub type ParseFn<T> = fn(&str, &mut ParamMap) -> Result<Option<T>>;

/// Key/value configuration for one bundling run.
///
/// Keys are parameter ids; values are [`ParamValue`]s. The map is
/// append-only during a run: resolvers cache derived values into it.
#[derive(Clone, Default, PartialEq)]
pub struct ParamMap {
    values: HashMap<String, ParamValue>,
    resolving: Vec<&'static str>,
}

impl ParamMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Stores an explicit null under `key`.
    pub fn insert_null(&mut self, key: impl Into<String>) {
        self.values.insert(key.into(), ParamValue::Null);
    }

    /// Raw access to a stored value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    /// Whether `key` has been set or resolved.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    /// Copies every entry of `other` over this map.
    pub fn extend(&mut self, other: &ParamMap) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn enter(&mut self, id: &'static str) -> Result<()> {
        if self.resolving.contains(&id) {
            let mut chain: Vec<&str> = self
                .resolving
                .iter()
                .skip_while(|k| **k != id)
                .copied()
                .collect();
            chain.push(id);
            return Err(Error::ResolutionCycle {
                chain: chain.join(" -> "),
            });
        }
        self.resolving.push(id);
        Ok(())
    }

    fn leave(&mut self, id: &'static str) {
        if let Some(pos) = self.resolving.iter().rposition(|k| *k == id) {
            self.resolving.remove(pos);
        }
    }
}

impl fmt::Debug for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.keys() {
            map.entry(&key, &self.values[key]);
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Descriptive view of a parameter, independent of its value type.
pub trait ParamInfo: Sync {
    /// Map key.
    fn id(&self) -> &'static str;
    /// Display name.
    fn name(&self) -> &'static str;
    /// Longer description.
    fn description(&self) -> &'static str;
    /// Value type label.
    fn value_kind(&self) -> &'static str;
    /// Whether users can set it from a string.
    fn accepts_string(&self) -> bool;
}

/// A named, typed configuration entry.
///
/// Declared as `static`s; see [`standard`] for the common set.
pub struct BundlerParam<T: ParamType> {
    /// Map key.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Longer description.
    pub description: &'static str,
    /// Derives a value when the map has none.
    pub default: DefaultFn<T>,
    /// Parses user strings; `None` means strings are not accepted.
    pub parser: Option<ParseFn<T>>,
    /// Ties the entry to its value type.
    pub kind: PhantomData<fn() -> T>,
}

impl<T: ParamType> BundlerParam<T> {
    /// Resolves the parameter against `map`, caching the result.
    ///
    /// # Errors
    ///
    /// Fails when a user string does not parse, when the stored value has the
    /// wrong type, or when resolution re-enters a key that is still resolving.
    pub fn fetch(&self, map: &mut ParamMap) -> Result<Option<T>> {
        match (map.get(self.id), self.parser) {
            (Some(ParamValue::Null), _) => return Ok(None),
            (Some(ParamValue::Raw(raw)), Some(parse)) => {
                let raw = raw.clone();
                map.enter(self.id)?;
                let parsed = parse(&raw, map);
                map.leave(self.id);
                let value = parsed.map_err(|e| self.parse_error(&raw, e))?;
                match &value {
                    Some(v) => map.insert(self.id, v.clone().into_value()),
                    None => map.insert_null(self.id),
                }
                return Ok(value);
            }
            (Some(stored), _) => {
                return T::from_value(stored).map(Some).ok_or_else(|| Error::ParamType {
                    id: self.id.to_string(),
                    expected: T::KIND,
                    found: stored.kind(),
                });
            }
            (None, _) => {}
        }

        map.enter(self.id)?;
        let derived = (self.default)(map);
        map.leave(self.id);
        let value = derived?;
        if let Some(v) = &value {
            map.insert(self.id, v.clone().into_value());
        }
        Ok(value)
    }

    fn parse_error(&self, raw: &str, error: Error) -> Error {
        if error.is_config() {
            return error;
        }
        Error::config(
            format!("Invalid value \"{raw}\" for parameter '{}': {error}", self.id),
            format!("Correct or remove the value of '{}'.", self.id),
        )
    }

    /// Resolves the parameter, failing when it has no value.
    pub fn require(&self, map: &mut ParamMap) -> Result<T> {
        self.fetch(map)?
            .ok_or_else(|| Error::MissingParameter(self.id.to_string()))
    }

    /// Whether the map already holds a value (user supplied or derived).
    pub fn is_set(&self, map: &ParamMap) -> bool {
        map.contains_key(self.id)
    }

    /// Stores a typed value.
    pub fn set(&self, map: &mut ParamMap, value: T) {
        map.insert(self.id, value.into_value());
    }
}

impl<T: ParamType> ParamInfo for BundlerParam<T> {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn value_kind(&self) -> &'static str {
        T::KIND
    }

    fn accepts_string(&self) -> bool {
        self.parser.is_some()
    }
}

/// No default value.
pub fn no_default<T>(_: &mut ParamMap) -> Result<Option<T>> {
    Ok(None)
}
