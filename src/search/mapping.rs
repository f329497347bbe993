//! Mapping introspection.
//!
//! Converts a `_mapping` response into a flat list of field descriptors.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::FieldDescriptor;

/// Extracts field descriptors from a `GET /<collection>/_mapping` body.
///
/// The body is keyed by concrete index name; when a pattern or alias
/// resolves to several indices their fields are merged, first definition
/// wins.
pub fn fields_from_mapping_response(body: &Value) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();
    let mut seen = HashSet::new();

    let Some(indices) = body.as_object() else {
        return fields;
    };

    for index in indices.values() {
        let Some(properties) = index
            .get("mappings")
            .and_then(|m| m.get("properties"))
            .and_then(Value::as_object)
        else {
            continue;
        };

        let mut index_fields = Vec::new();
        collect_properties(&mut index_fields, "", properties);

        for field in index_fields {
            if seen.insert(field.name.clone()) {
                fields.push(field);
            }
        }
    }

    fields
}

fn collect_properties(out: &mut Vec<FieldDescriptor>, prefix: &str, properties: &Map<String, Value>) {
    for (name, definition) in properties {
        let full_name = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        // Object fields carry `properties` and usually no explicit type
        if let Some(nested) = definition.get("properties").and_then(Value::as_object) {
            let data_type = definition
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("object");
            if data_type == "nested" {
                out.push(FieldDescriptor::new(&full_name, data_type).with_raw(definition.clone()));
            }
            collect_properties(out, &full_name, nested);
            continue;
        }

        let data_type = definition
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        out.push(FieldDescriptor::new(&full_name, data_type).with_raw(definition.clone()));

        // Multi-fields, e.g. `title.keyword`
        if let Some(sub_fields) = definition.get("fields").and_then(Value::as_object) {
            for (sub_name, sub_definition) in sub_fields {
                let sub_type = sub_definition
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                out.push(
                    FieldDescriptor::new(format!("{full_name}.{sub_name}"), sub_type)
                        .with_raw(sub_definition.clone()),
                );
            }
        }
    }
}

/// Formats fields as a bullet list for display or prompts.
pub fn format_fields(fields: &[FieldDescriptor]) -> String {
    fields
        .iter()
        .map(|f| format!("  - {}: {}\n", f.name, f.data_type))
        .collect()
}
