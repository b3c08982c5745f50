/// Sparse field updates for structured records
///
/// Editor clients send item edits as a map of wire field name -> new value
/// rather than a full record. Each patchable type declares its own field
/// table mapping wire names onto setters, so updates stay strongly typed
/// without any runtime introspection.
///
/// Rules applied per (key, value) pair:
/// - unknown keys fail the whole call
/// - a JSON null resets the field to its zero value
/// - a JSON object recurses into a nested record
/// - scalar values are coerced to the declared field type where JSON allows
///   it (numbers widen or truncate), otherwise the call fails naming the
///   field
use serde_json::{ Map, Value };

use crate::models::{ EditorPoint, ItemDimensions, RoomItem };

/// Errors produced while applying a field-update map
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("Invalid property '{0}'")]
    UnknownProperty(String),

    #[error("Unable to convert {found} to {expected} for field '{field}'")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A record that accepts sparse wire-field updates
pub trait Patchable {
    /// Apply a single (wire field name, value) pair
    fn apply_field(&mut self, key: &str, value: &Value) -> Result<(), PatchError>;
}

/// Apply a full update map onto a record
///
/// Keys are applied in map order; the first failing key aborts the call.
/// Callers should treat the record as tainted on failure since earlier keys
/// in the same map have already been applied.
pub fn apply_updates<T: Patchable>(
    target: &mut T,
    updates: &Map<String, Value>,
) -> Result<(), PatchError> {
    for (key, value) in updates {
        target.apply_field(key, value)?;
    }
    Ok(())
}

impl Patchable for RoomItem {
    fn apply_field(&mut self, key: &str, value: &Value) -> Result<(), PatchError> {
        match key {
            "name" => patch_string(&mut self.name, key, value),
            "quantity" => patch_i64(&mut self.quantity, key, value),
            "claimedBy" => patch_string(&mut self.claimed_by, key, value),
            "visibleInEditor" => patch_bool(&mut self.visible_in_editor, key, value),
            "dimensions" => patch_nested(&mut self.dimensions, key, value),
            "editorPosition" => patch_nested(&mut self.editor_position, key, value),
            "editorRotation" => patch_f64(&mut self.editor_rotation, key, value),
            "editorLocked" => patch_bool(&mut self.editor_locked, key, value),
            "editorZIndex" => patch_f64(&mut self.editor_z_index, key, value),
            // "id" is intentionally absent: item ids are immutable
            _ => Err(PatchError::UnknownProperty(key.to_string())),
        }
    }
}

impl Patchable for ItemDimensions {
    fn apply_field(&mut self, key: &str, value: &Value) -> Result<(), PatchError> {
        match key {
            "width" => patch_f64(&mut self.width, key, value),
            "length" => patch_f64(&mut self.length, key, value),
            "height" => patch_f64(&mut self.height, key, value),
            _ => Err(PatchError::UnknownProperty(key.to_string())),
        }
    }
}

impl Patchable for EditorPoint {
    fn apply_field(&mut self, key: &str, value: &Value) -> Result<(), PatchError> {
        match key {
            "x" => patch_f64(&mut self.x, key, value),
            "y" => patch_f64(&mut self.y, key, value),
            _ => Err(PatchError::UnknownProperty(key.to_string())),
        }
    }
}

fn patch_f64(field: &mut f64, key: &str, value: &Value) -> Result<(), PatchError> {
    match value {
        Value::Null => {
            *field = 0.0;
            Ok(())
        }
        Value::Number(n) => match n.as_f64() {
            Some(v) => {
                *field = v;
                Ok(())
            }
            None => Err(mismatch(key, "number", value)),
        },
        _ => Err(mismatch(key, "number", value)),
    }
}

fn patch_i64(field: &mut i64, key: &str, value: &Value) -> Result<(), PatchError> {
    match value {
        Value::Null => {
            *field = 0;
            Ok(())
        }
        Value::Number(n) => {
            // JSON numbers may arrive as floats; truncate like a numeric cast
            if let Some(v) = n.as_i64() {
                *field = v;
                Ok(())
            } else if let Some(v) = n.as_f64() {
                *field = v as i64;
                Ok(())
            } else {
                Err(mismatch(key, "integer", value))
            }
        }
        _ => Err(mismatch(key, "integer", value)),
    }
}

fn patch_bool(field: &mut bool, key: &str, value: &Value) -> Result<(), PatchError> {
    match value {
        Value::Null => {
            *field = false;
            Ok(())
        }
        Value::Bool(v) => {
            *field = *v;
            Ok(())
        }
        _ => Err(mismatch(key, "bool", value)),
    }
}

fn patch_string(field: &mut String, key: &str, value: &Value) -> Result<(), PatchError> {
    match value {
        Value::Null => {
            field.clear();
            Ok(())
        }
        Value::String(v) => {
            *field = v.clone();
            Ok(())
        }
        _ => Err(mismatch(key, "string", value)),
    }
}

fn patch_nested<T: Patchable + Default>(
    field: &mut T,
    key: &str,
    value: &Value,
) -> Result<(), PatchError> {
    match value {
        Value::Null => {
            *field = T::default();
            Ok(())
        }
        Value::Object(updates) => apply_updates(field, updates),
        _ => Err(mismatch(key, "object", value)),
    }
}

fn mismatch(key: &str, expected: &'static str, found: &Value) -> PatchError {
    PatchError::TypeMismatch {
        field: key.to_string(),
        expected,
        found: json_type_name(found),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn updates(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_scalar_updates() {
        let mut item = RoomItem::default();
        apply_updates(
            &mut item,
            &updates(json!({"name": "Lamp", "quantity": 3, "editorRotation": 45.0})),
        )
        .unwrap();

        assert_eq!(item.name, "Lamp");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.editor_rotation, 45.0);
    }

    #[test]
    fn test_null_resets_to_zero_value() {
        let mut item = RoomItem {
            quantity: 7,
            claimed_by: "sam".to_string(),
            ..Default::default()
        };
        apply_updates(&mut item, &updates(json!({"quantity": null, "claimedBy": null}))).unwrap();

        assert_eq!(item.quantity, 0);
        assert_eq!(item.claimed_by, "");
    }

    #[test]
    fn test_null_resets_nested_record() {
        let mut item = RoomItem {
            dimensions: ItemDimensions { width: 4.0, length: 2.0, height: 1.0 },
            ..Default::default()
        };
        apply_updates(&mut item, &updates(json!({"dimensions": null}))).unwrap();
        assert_eq!(item.dimensions, ItemDimensions::default());
    }

    #[test]
    fn test_nested_update_leaves_siblings_untouched() {
        let mut item = RoomItem {
            dimensions: ItemDimensions { width: 1.0, length: 2.0, height: 3.0 },
            ..Default::default()
        };
        apply_updates(&mut item, &updates(json!({"dimensions": {"width": 5}}))).unwrap();

        assert_eq!(item.dimensions.width, 5.0);
        assert_eq!(item.dimensions.length, 2.0);
        assert_eq!(item.dimensions.height, 3.0);
    }

    #[test]
    fn test_unknown_property_fails() {
        let mut item = RoomItem::default();
        let err = apply_updates(&mut item, &updates(json!({"color": "red"}))).unwrap_err();
        assert!(matches!(err, PatchError::UnknownProperty(ref k) if k == "color"));
    }

    #[test]
    fn test_id_is_not_patchable() {
        let mut item = RoomItem { id: "keep".to_string(), ..Default::default() };
        let err = apply_updates(&mut item, &updates(json!({"id": "other"}))).unwrap_err();
        assert!(matches!(err, PatchError::UnknownProperty(_)));
        assert_eq!(item.id, "keep");
    }

    #[test]
    fn test_type_mismatch_names_field() {
        let mut item = RoomItem::default();
        let err = apply_updates(&mut item, &updates(json!({"editorLocked": "yes"}))).unwrap_err();
        match err {
            PatchError::TypeMismatch { field, expected, found } => {
                assert_eq!(field, "editorLocked");
                assert_eq!(expected, "bool");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_float_truncates_into_integer_field() {
        let mut item = RoomItem::default();
        apply_updates(&mut item, &updates(json!({"quantity": 5.9}))).unwrap();
        assert_eq!(item.quantity, 5);
    }

    #[test]
    fn test_failure_keeps_earlier_keys_applied() {
        // serde_json object keys iterate in insertion order only with the
        // preserve_order feature, so apply the keys one by one here
        let mut item = RoomItem::default();
        item.apply_field("name", &json!("Rug")).unwrap();
        let err = item.apply_field("bogus", &json!(1)).unwrap_err();
        assert!(matches!(err, PatchError::UnknownProperty(_)));
        assert_eq!(item.name, "Rug");
    }
}
