// Deep merge of YAML documents for zapcfg
// Overlay values win; named lists are merged entry by entry

use serde_yaml::{Mapping, Value};

/// Merge `overlay` into `base` in place.
///
/// - mappings merge key by key
/// - lists whose entries all carry a `name` merge by that name, new names are appended
/// - other lists get the overlay entries they do not already contain appended
/// - anything else is replaced by the overlay value
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            merge_mappings(base_map, overlay_map);
        }
        (Value::Sequence(base_seq), Value::Sequence(overlay_seq)) => {
            if is_named_list(base_seq) && is_named_list(&overlay_seq) {
                merge_named(base_seq, overlay_seq);
            } else {
                for item in overlay_seq {
                    if !base_seq.contains(&item) {
                        base_seq.push(item);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn merge_mappings(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn entry_name(value: &Value) -> Option<&str> {
    value.as_mapping()?.get("name")?.as_str()
}

fn is_named_list(seq: &[Value]) -> bool {
    seq.iter().all(|v| entry_name(v).is_some())
}

fn merge_named(base: &mut Vec<Value>, overlay: Vec<Value>) {
    for item in overlay {
        let position = entry_name(&item)
            .and_then(|name| base.iter().position(|b| entry_name(b) == Some(name)));
        match position {
            Some(idx) => merge_values(&mut base[idx], item),
            None => base.push(item),
        }
    }
}
