//! Nested form values: the shape cascade selectors post back.
//!
//! Each selector is named `field[0][k1]…[kn][value]`, so a submitted form
//! arrives as nested maps:
//!
//! ```text
//! region/north  ⇄  {"0": {"value": "region", "region": {"value": "north"}}}
//! ```
//!
//! `"0"` is the root sentinel. Following the `value` entries from the first
//! map yields the selection path.

use serde_json::{Map, Value};

use crate::path::SelectionPath;

/// Key of the outermost map.
pub const ROOT_SENTINEL: &str = "0";

/// Key holding the selected option inside each map.
pub const VALUE_KEY: &str = "value";

/// Expand a selection into the nested form shape.
///
/// The empty path becomes an empty object.
pub fn to_nested(path: &SelectionPath) -> Value {
    let mut inner: Option<(String, Map<String, Value>)> = None;

    // Build from the deepest map outwards.
    for depth in (0..path.len()).rev() {
        let mut map = Map::new();
        map.insert(VALUE_KEY.into(), Value::String(path.segments()[depth].clone()));
        if let Some((key, child)) = inner.take() {
            map.insert(key, Value::Object(child));
        }
        let owner = match depth {
            0 => ROOT_SENTINEL.to_string(),
            d => path.segments()[d - 1].clone(),
        };
        inner = Some((owner, map));
    }

    let mut root = Map::new();
    if let Some((key, map)) = inner {
        root.insert(key, Value::Object(map));
    }
    Value::Object(root)
}

/// Collapse a nested form value into a selection.
///
/// Descent starts at the `"0"` entry, or the first entry when a host renamed
/// it. Anything that is not an object yields the empty path. Descent stops at
/// the first missing, empty or non-string `value`.
///
/// Choice keys never equal `value`, so a child map cannot shadow the selected
/// key stored beside it.
pub fn from_nested(value: &Value) -> SelectionPath {
    let mut segments = Vec::new();
    let Some(mut current) = value
        .as_object()
        .and_then(|m| m.get(ROOT_SENTINEL).or_else(|| m.values().next()))
    else {
        return SelectionPath::new();
    };

    while let Some(selected) = current
        .get(VALUE_KEY)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        segments.push(selected.to_string());
        match current.get(selected) {
            Some(next) => current = next,
            None => break,
        }
    }

    segments.into_iter().collect()
}
