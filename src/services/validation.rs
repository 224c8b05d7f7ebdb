//! Input validation for the three assistant operations and the output
//! contracts the model's replies are checked against.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::{AssistantError, Result};
use crate::models::{ChatRequest, DataUri, ModerationRequest, RecipeRequest};

/// Parse a data-URI field, naming the field on failure.
pub fn data_uri(field: &str, raw: &str) -> Result<DataUri> {
    DataUri::parse(raw).map_err(|reason| AssistantError::validation(field, reason))
}

fn non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AssistantError::validation(field, "must not be empty"));
    }
    Ok(())
}

impl ModerationRequest {
    pub fn validate(&self) -> Result<DataUri> {
        data_uri("photoDataUri", &self.photo_data_uri)
    }
}

impl RecipeRequest {
    pub fn validate(&self) -> Result<DataUri> {
        data_uri("foodPhotoDataUri", &self.food_photo_data_uri)
    }
}

impl ChatRequest {
    pub fn validate(&self) -> Result<()> {
        non_blank("question", &self.question)
    }
}

/// Deserialize a raw JSON request, reporting missing or mistyped fields by name.
pub fn request_from_json<T: DeserializeOwned>(schema: &ObjectSchema, value: Value) -> Result<T> {
    if let Some((field, message)) = schema.violation(&value) {
        return Err(AssistantError::validation(field.unwrap_or(schema.name), message));
    }
    serde_json::from_value(value).map_err(|e| AssistantError::validation(schema.name, e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    String,
}

impl FieldKind {
    fn json_type(self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::String => "string",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::String => value.is_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

/// Declared shape of a JSON object: field names and primitive types.
#[derive(Debug, Clone, Copy)]
pub struct ObjectSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ObjectSchema {
    /// JSON Schema object sent to the model as the response contract
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(
                field.name.to_string(),
                json!({ "type": field.kind.json_type(), "description": field.description }),
            );
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// First mismatch between `value` and the declared shape, with the field it concerns.
    fn violation(&self, value: &Value) -> Option<(Option<&'static str>, String)> {
        let object = match value.as_object() {
            Some(object) => object,
            None => return Some((None, format!("{} must be a JSON object", self.name))),
        };

        for field in self.fields {
            match object.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Some((
                            Some(field.name),
                            format!("{} is missing required field '{}'", self.name, field.name),
                        ));
                    }
                }
                Some(v) if !field.kind.matches(v) => {
                    return Some((
                        Some(field.name),
                        format!("{} field '{}' must be a {}", self.name, field.name, field.kind.json_type()),
                    ));
                }
                Some(_) => {}
            }
        }
        None
    }

    pub fn check(&self, value: &Value) -> Result<()> {
        match self.violation(value) {
            Some((_, message)) => Err(AssistantError::schema(message)),
            None => Ok(()),
        }
    }

    /// Check and deserialize a model reply.
    pub fn parse<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
        self.check(&value)?;
        serde_json::from_value(value).map_err(|e| AssistantError::schema(e.to_string()))
    }
}

const DATA_URI_DESCRIPTION: &str =
    "A photo as a data URI with a MIME type and Base64 encoding: 'data:<mimetype>;base64,<encoded_data>'.";
const LANGUAGE_DESCRIPTION: &str =
    "The language to respond in (e.g. \"Spanish\", \"French\", \"Tamil\"). Defaults to English.";

pub const MODERATION_INPUT: ObjectSchema = ObjectSchema {
    name: "ModerationRequest",
    fields: &[FieldSpec {
        name: "photoDataUri",
        kind: FieldKind::String,
        required: true,
        description: DATA_URI_DESCRIPTION,
    }],
};

pub const MODERATION_OUTPUT: ObjectSchema = ObjectSchema {
    name: "ModerationResult",
    fields: &[
        FieldSpec {
            name: "isFood",
            kind: FieldKind::Boolean,
            required: true,
            description: "Whether or not the image is of food.",
        },
        FieldSpec {
            name: "prompt",
            kind: FieldKind::String,
            required: true,
            description: "A prompt to the user if the image is not of food.",
        },
    ],
};

pub const RECIPE_INPUT: ObjectSchema = ObjectSchema {
    name: "RecipeRequest",
    fields: &[
        FieldSpec {
            name: "foodPhotoDataUri",
            kind: FieldKind::String,
            required: true,
            description: DATA_URI_DESCRIPTION,
        },
        FieldSpec {
            name: "language",
            kind: FieldKind::String,
            required: false,
            description: LANGUAGE_DESCRIPTION,
        },
    ],
};

pub const RECIPE_OUTPUT: ObjectSchema = ObjectSchema {
    name: "RecipeResult",
    fields: &[FieldSpec {
        name: "recipe",
        kind: FieldKind::String,
        required: true,
        description: "The generated recipe for the food image.",
    }],
};

pub const CHAT_INPUT: ObjectSchema = ObjectSchema {
    name: "ChatRequest",
    fields: &[
        FieldSpec {
            name: "question",
            kind: FieldKind::String,
            required: true,
            description: "The question about the recipe, ingredients, or alternatives.",
        },
        FieldSpec {
            name: "recipe",
            kind: FieldKind::String,
            required: false,
            description: "The recipe to use as context for answering the question.",
        },
        FieldSpec {
            name: "language",
            kind: FieldKind::String,
            required: false,
            description: LANGUAGE_DESCRIPTION,
        },
    ],
};

pub const CHAT_OUTPUT: ObjectSchema = ObjectSchema {
    name: "ChatResult",
    fields: &[FieldSpec {
        name: "answer",
        kind: FieldKind::String,
        required: true,
        description: "The answer to the question.",
    }],
};
