//! Task options: the open option map, deep merging and per-item overlays
//!
//! Options are a string-keyed map of JSON values. Insertion order is preserved,
//! which is what gives the item map its iteration order.
//!
//! Two operations resolve the configuration a hook actually sees:
//! - [`merge`] folds caller-supplied options into a task's declared defaults,
//!   recursing into nested maps
//! - [`overlay`] copies the task's base options and applies one item's override
//!   keys on top, leaving the base untouched

use crate::config::TaskSettings;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the item map (takes precedence over [`FILES`])
pub const ITEMS: &str = "items";
/// Legacy key holding the item map
pub const FILES: &str = "files";
/// Destination root for written artifacts
pub const DIST: &str = "dist";
/// Whether the task runs at all
pub const ENABLED: &str = "enabled";
/// Whether the whole pass is delegated to an isolated worker
pub const MULTITHREAD: &str = "multithread";
/// Whether written artifacts also report their gzip size
pub const GZIP_SIZE: &str = "gzipSize";
/// Byte ceiling above which a written artifact triggers a warning
pub const SIZE_THRESHOLD: &str = "sizeThreshold";
/// Logging hint, opaque to the engine
pub const LOG_COLOR: &str = "logColor";
/// Key of an object-form item holding its input reference
pub const INPUT: &str = "input";

/// String-keyed option map for a task
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    /// Create an empty option map
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Convert a JSON value into options
    ///
    /// Fails with a configuration error if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::Config {
                message: format!("options must be a mapping, got {}", type_name(&other)),
                key: None,
            }),
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one if present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keys
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON object value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Typed view of the recognized keys
    pub fn settings(&self) -> Result<TaskSettings> {
        TaskSettings::from_options(self)
    }

    /// Parse the item map from `items`, falling back to `files`
    ///
    /// Returns `Ok(None)` when neither key is set. An empty array is accepted
    /// as an empty map; any other non-mapping value is a configuration error.
    pub fn item_map(&self) -> Result<Option<ItemMap>> {
        let (key, value) = match self.0.get(ITEMS).filter(|v| !v.is_null()) {
            Some(value) => (ITEMS, value),
            None => match self.0.get(FILES).filter(|v| !v.is_null()) {
                Some(value) => (FILES, value),
                None => return Ok(None),
            },
        };

        match value {
            Value::Object(entries) => {
                let mut items = ItemMap::with_capacity(entries.len());
                for (output, spec) in entries {
                    items.insert(output.clone(), ItemSpec::from_value(output, spec)?);
                }
                Ok(Some(items))
            }
            Value::Array(entries) if entries.is_empty() => Ok(Some(ItemMap::new())),
            other => Err(Error::config(
                key,
                format!(
                    "`{key}` must map output names to inputs, got {}",
                    type_name(other)
                ),
            )),
        }
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Options {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

/// Ordered mapping from output name to item spec
pub type ItemMap = IndexMap<String, ItemSpec>;

/// One entry of the item map
#[derive(Clone, Debug, PartialEq)]
pub enum ItemSpec {
    /// Bare input reference
    Input(String),
    /// Input reference plus option overrides that apply to this item only
    Detailed {
        /// Input reference
        input: String,
        /// Every key of the item object except `input`
        overrides: Map<String, Value>,
    },
}

impl ItemSpec {
    /// Parse an item spec for `output`
    pub fn from_value(output: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(input) => Ok(ItemSpec::Input(input.clone())),
            Value::Object(fields) => {
                let input = fields
                    .get(INPUT)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::config(
                            output,
                            format!("item `{output}` needs a string `input` field"),
                        )
                    })?
                    .to_string();
                let overrides = fields
                    .iter()
                    .filter(|(key, _)| key.as_str() != INPUT)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Ok(ItemSpec::Detailed { input, overrides })
            }
            other => Err(Error::config(
                output,
                format!(
                    "item `{output}` must be a string or an object, got {}",
                    type_name(other)
                ),
            )),
        }
    }

    /// The input reference
    pub fn input(&self) -> &str {
        match self {
            ItemSpec::Input(input) | ItemSpec::Detailed { input, .. } => input,
        }
    }

    /// Item-specific overrides, if any
    pub fn overrides(&self) -> Option<&Map<String, Value>> {
        match self {
            ItemSpec::Input(_) => None,
            ItemSpec::Detailed { overrides, .. } => Some(overrides),
        }
    }
}

/// Deep-merge `supplied` over `defaults`
///
/// Where both sides hold a nested map the maps are merged key by key; any other
/// supplied value (scalar, array, null) replaces the default wholesale.
pub fn merge(defaults: &Options, supplied: &Options) -> Options {
    Options(merge_maps(&defaults.0, &supplied.0))
}

fn merge_maps(defaults: &Map<String, Value>, supplied: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in supplied {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(base)), Value::Object(over)) => {
                Value::Object(merge_maps(base, over))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

/// Effective options for one item: a shallow copy of `base` with the item's
/// overrides applied. `base` is never modified.
pub fn overlay(base: &Options, item: &ItemSpec) -> Options {
    let mut effective = base.clone();
    if let Some(overrides) = item.overrides() {
        for (key, value) in overrides {
            effective.0.insert(key.clone(), value.clone());
        }
    }
    effective
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
