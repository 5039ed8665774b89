//! JSON-Schema → Gemini function-parameter schema.
//!
//! Only the top-level object and its immediate properties are translated.
//! Nested objects and arrays collapse to `STRING`, the same fallback as any
//! unrecognized type.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Gemini's (OpenAPI-flavoured) parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Object,
}

impl SchemaType {
    /// Map a JSON-Schema `type` value. Anything unrecognized, including a
    /// missing or non-string type, becomes `String`.
    pub fn from_json_type(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("string") => SchemaType::String,
            Some("number") | Some("integer") => SchemaType::Number,
            Some("boolean") => SchemaType::Boolean,
            _ => SchemaType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, GeminiSchema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl GeminiSchema {
    fn leaf(schema_type: SchemaType, description: Option<String>) -> Self {
        Self {
            schema_type,
            description,
            properties: None,
            required: Vec::new(),
        }
    }

    fn empty_object() -> Self {
        Self {
            schema_type: SchemaType::Object,
            description: None,
            properties: Some(IndexMap::new()),
            required: Vec::new(),
        }
    }
}

/// Translate a tool's `inputSchema` into Gemini `parameters`.
///
/// The result is always an object schema with exactly one entry per
/// declared property. A missing or non-object `properties` yields an object
/// with no properties.
pub fn translate_schema(input: &Value) -> GeminiSchema {
    let mut schema = GeminiSchema::empty_object();

    let Some(properties) = input.get("properties").and_then(Value::as_object) else {
        return schema;
    };

    let mut translated = IndexMap::with_capacity(properties.len());
    for (name, details) in properties {
        let description = details
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);
        let schema_type = SchemaType::from_json_type(details.get("type"));
        translated.insert(name.clone(), GeminiSchema::leaf(schema_type, description));
    }

    // Keep only names that were actually declared.
    schema.required = input
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .filter(|n| translated.contains_key(*n))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    schema.properties = Some(translated);
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_mapping() {
        let schema = translate_schema(&json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Full name"},
                "age": {"type": "integer"},
                "height": {"type": "number"},
                "vegan": {"type": "boolean"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "address": {"type": "object", "properties": {"city": {"type": "string"}}},
                "mystery": {}
            }
        }));

        assert_eq!(schema.schema_type, SchemaType::Object);
        let props = schema.properties.unwrap();
        assert_eq!(props.len(), 7);
        assert_eq!(props["name"].schema_type, SchemaType::String);
        assert_eq!(props["name"].description.as_deref(), Some("Full name"));
        assert_eq!(props["age"].schema_type, SchemaType::Number);
        assert_eq!(props["height"].schema_type, SchemaType::Number);
        assert_eq!(props["vegan"].schema_type, SchemaType::Boolean);
        assert_eq!(props["tags"].schema_type, SchemaType::String);
        assert_eq!(props["address"].schema_type, SchemaType::String);
        assert!(props["address"].properties.is_none());
        assert_eq!(props["mystery"].schema_type, SchemaType::String);
        assert!(props["mystery"].description.is_none());
    }

    #[test]
    fn test_missing_properties_is_empty_object() {
        for input in [
            json!({"type": "object"}),
            json!({"type": "object", "properties": "nope"}),
            json!(null),
        ] {
            let schema = translate_schema(&input);
            assert_eq!(schema.schema_type, SchemaType::Object);
            assert!(schema.properties.unwrap().is_empty());
        }
    }

    #[test]
    fn test_get_humans_schema_wire_shape() {
        let schema = translate_schema(&json!({"type": "object", "properties": {}}));
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"type": "OBJECT", "properties": {}})
        );
    }

    #[test]
    fn test_required_keeps_declared_names_only() {
        let schema = translate_schema(&json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message", "ghost"]
        }));
        assert_eq!(schema.required, vec!["message".to_string()]);
        let wire = serde_json::to_value(&schema).unwrap();
        assert_eq!(wire["properties"]["message"], json!({"type": "STRING"}));
    }
}
