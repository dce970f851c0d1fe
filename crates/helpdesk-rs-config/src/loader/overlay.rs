//! Folding config layers into one JSON document.

use serde_json::{Map, Value};

/// Fold `layer` into `base`. Sections merge key by key; any other value
/// replaces what lower layers set. Lists are replaced whole and `null` unsets
/// an optional setting.
pub(super) fn apply(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        let Value::Object(overrides) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(Value::Object(section)) = base.get_mut(&key) {
            apply(section, overrides);
            continue;
        }
        base.insert(key, Value::Object(overrides));
    }
}
