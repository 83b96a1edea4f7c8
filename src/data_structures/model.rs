//! Parsed building-model input.
//!
//! The engine consumes `{ "elements": { "<category>": [record, ...] }, "meta": {...} }`.
//! Records are kept read-only and shared: a placed element points back at its
//! source record instead of copying it.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::ViewerError;

const IDENTIFIER_FIELDS: [&str; 6] = [
    "GlobalId",
    "globalId",
    "global_id",
    "id",
    "expressID",
    "express_id",
];
const NAME_FIELDS: [&str; 4] = ["Name", "name", "LongName", "ObjectType"];

/// One raw element record of the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelElement {
    pub category: String,
    pub identifier: String,
    pub display_name: String,
    pub attributes: Map<String, Value>,
}

impl ModelElement {
    /// Build an element from a raw record; `index` is its position inside the category.
    pub fn from_record(category: &str, index: usize, record: Value) -> Self {
        let attributes = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let identifier = first_text(&attributes, &IDENTIFIER_FIELDS)
            .unwrap_or_else(|| format!("{}-{}", category, index));
        let display_name = first_text(&attributes, &NAME_FIELDS)
            .unwrap_or_else(|| format!("{} {}", category, index + 1));
        Self {
            category: category.to_string(),
            identifier,
            display_name,
            attributes,
        }
    }
}

fn first_text(attributes: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match attributes.get(*field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// All records of one category, in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementCollection {
    pub category: String,
    pub elements: Vec<Rc<ModelElement>>,
}

/// A parsed model. Categories keep the order in which they appear in the source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelData {
    pub collections: Vec<ElementCollection>,
    pub meta: Option<Value>,
}

impl ModelData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(source: &str) -> Result<Self, ViewerError> {
        let value: Value = serde_json::from_str(source)?;
        Ok(Self::from_value(value))
    }

    /// Anything without an `elements` object is an empty model, not an error.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            log::debug!("model root is not an object, treating it as empty");
            return Self::empty();
        };
        let meta = root.remove("meta").filter(|meta| !meta.is_null());
        let collections = match root.remove("elements") {
            Some(Value::Object(elements)) => elements
                .into_iter()
                .map(|(category, records)| {
                    let records = match records {
                        Value::Array(records) => records,
                        Value::Null => Vec::new(),
                        other => {
                            log::debug!(
                                "category {} holds {} instead of an array, skipping it",
                                category,
                                type_name(&other)
                            );
                            Vec::new()
                        }
                    };
                    ElementCollection::from_records(category, records)
                })
                .collect(),
            _ => Vec::new(),
        };
        Self { collections, meta }
    }

    /// Append a category; used when the model is assembled in code rather than parsed.
    pub fn with_category(mut self, category: &str, records: Vec<Value>) -> Self {
        self.collections
            .push(ElementCollection::from_records(category.to_string(), records));
        self
    }

    /// Number of elements across all categories.
    pub fn total_elements(&self) -> usize {
        self.collections.iter().map(|c| c.elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_elements() == 0
    }
}

impl ElementCollection {
    fn from_records(category: String, records: Vec<Value>) -> Self {
        let elements = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Rc::new(ModelElement::from_record(&category, index, record)))
            .collect();
        Self { category, elements }
    }
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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identifier_falls_back_through_source_fields() {
        let model = ModelData::from_value(json!({
            "elements": {
                "doors": [
                    { "GlobalId": "2O2Fr$t4X7Zf8NOew3FLOH", "Name": "Door A" },
                    { "expressID": 4711 },
                    { "id": "  ", "global_id": "g-3", "LongName": "Fire door" },
                    "not an object"
                ]
            }
        }));
        let doors = &model.collections[0].elements;
        assert_eq!(doors[0].identifier, "2O2Fr$t4X7Zf8NOew3FLOH");
        assert_eq!(doors[0].display_name, "Door A");
        assert_eq!(doors[1].identifier, "4711");
        assert_eq!(doors[1].display_name, "doors 2");
        assert_eq!(doors[2].identifier, "g-3");
        assert_eq!(doors[2].display_name, "Fire door");
        assert_eq!(doors[3].identifier, "doors-3");
        assert!(doors[3].attributes.is_empty());
    }

    #[test]
    fn categories_keep_document_order() {
        let model = ModelData::from_json(
            r#"{ "elements": { "windows": [{}], "doors": [{}, {}], "beams": [] } }"#,
        )
        .unwrap();
        let order: Vec<_> = model.collections.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(order, ["windows", "doors", "beams"]);
        assert_eq!(model.total_elements(), 3);
    }

    #[test]
    fn missing_elements_is_an_empty_model() {
        assert!(ModelData::from_value(json!({ "meta": { "schema": "IFC4" } })).is_empty());
        assert!(ModelData::from_value(json!({ "elements": null })).is_empty());
        assert!(ModelData::from_value(json!([1, 2, 3])).is_empty());
        assert!(ModelData::from_value(json!({ "elements": { "walls": 3 } })).is_empty());
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            ModelData::from_json("{ elements"),
            Err(ViewerError::InvalidModel(_))
        ));
    }
}
