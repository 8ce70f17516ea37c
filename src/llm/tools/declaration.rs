//! Tool declaration helpers using JSON Schema generation

use schemars::{gen::SchemaSettings, JsonSchema};

use crate::llm::core::types::ToolDeclaration;

/// Schema keywords the generative-language API rejects
const UNSUPPORTED_KEYS: [&str; 3] = ["$schema", "title", "definitions"];

/// Create a tool declaration from a type that implements JsonSchema
///
/// Field doc comments become parameter descriptions. Subschemas are inlined
/// and keywords outside the API's OpenAPI subset are removed.
pub fn create_tool_declaration<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDeclaration {
    let settings = SchemaSettings::openapi3().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();

    let mut input_schema = serde_json::to_value(&schema)
        .expect("Failed to serialize schema - this is a bug in schemars or the JsonSchema impl");
    if let Some(object) = input_schema.as_object_mut() {
        for key in UNSUPPORTED_KEYS {
            object.remove(key);
        }
    }

    ToolDeclaration {
        name: name.into(),
        description: description.into(),
        input_schema,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct LocationArgs {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    }

    #[test]
    fn test_create_tool_declaration() {
        let decl = create_tool_declaration::<LocationArgs>("getWeather", "Get the weather");

        assert_eq!(decl.name, "getWeather");
        assert_eq!(decl.description, "Get the weather");

        let schema_obj = decl.input_schema.as_object().unwrap();
        assert!(!schema_obj.contains_key("$schema"));
        assert!(!schema_obj.contains_key("title"));
        assert_eq!(schema_obj["type"], "object");
        assert!(schema_obj["properties"]["latitude"].is_object());
        assert_eq!(schema_obj["required"], serde_json::json!(["latitude", "longitude"]));
    }

    #[test]
    fn test_schema_includes_doc_comments() {
        let decl = create_tool_declaration::<LocationArgs>("getWeather", "test");
        let schema_str = serde_json::to_string(&decl.input_schema).unwrap();

        assert!(schema_str.contains("Latitude in degrees"));
        assert!(schema_str.contains("Longitude in degrees"));
    }
}
