//! Shared types for docsmith
//!
//! This crate provides the types exchanged between the build pipeline and
//! whatever renders navigation: the per-page outline and the site manifest.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a page outline.
///
/// Top-level entries (from `h2`) always carry `children`, possibly empty.
/// Nested entries (from `h3`) leave it as `None`.
///
/// Serializes to the same object as the `sections` module export, with
/// annotation entries spread beside `title` and `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub struct Section {
    pub title: String,
    pub id: String,
    pub annotation: Map<String, Value>,
    pub children: Option<Vec<Section>>,
}

impl Section {
    /// Create a top-level section with an empty child list
    pub fn top(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            annotation: Map::new(),
            children: Some(Vec::new()),
        }
    }

    /// Create a leaf section (no `children` key)
    pub fn leaf(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            annotation: Map::new(),
            children: None,
        }
    }

    pub fn with_annotation(mut self, annotation: Map<String, Value>) -> Self {
        self.annotation = annotation;
        self
    }

    /// Convert to the object shape used for module exports.
    ///
    /// Annotation entries are spread after `title`, `id` and `children`,
    /// so an annotation key overrides a field of the same name.
    pub fn to_export_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("title".to_string(), Value::String(self.title.clone()));
        object.insert("id".to_string(), Value::String(self.id.clone()));
        if let Some(children) = &self.children {
            object.insert(
                "children".to_string(),
                Value::Array(children.iter().map(Section::to_export_value).collect()),
            );
        }
        for (key, value) in &self.annotation {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Read a section back from its export shape.
    ///
    /// Keys other than `title`, `id` and `children` are treated as annotation.
    pub fn from_export_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let title = object.get("title")?.as_str()?.to_string();
        let id = object.get("id")?.as_str()?.to_string();
        let children = match object.get("children") {
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .map(Section::from_export_value)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Some(_) => return None,
            None => None,
        };
        let annotation = object
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "title" | "id" | "children"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            title,
            id,
            annotation,
            children,
        })
    }
}

impl From<Section> for Value {
    fn from(section: Section) -> Self {
        section.to_export_value()
    }
}

impl TryFrom<Value> for Section {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Section::from_export_value(&value)
            .ok_or_else(|| "expected a section object with string `title` and `id`".to_string())
    }
}

/// Site-level metadata written into the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub title: String,
    pub base_url: String,
}

/// Navigation entry for one built page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Route path, e.g. `/docs/getting-started`
    pub route: String,
    /// Source path relative to the content directory
    pub source: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// The navigation manifest written next to the built pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub site: SiteInfo,
    pub generated_at: String,
    pub pages: Vec<PageEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_value_shape() {
        let mut section = Section::top("Getting Started", "getting-started");
        section
            .children
            .as_mut()
            .unwrap()
            .push(Section::leaf("Step One", "step-one"));

        assert_eq!(
            section.to_export_value(),
            json!({
                "title": "Getting Started",
                "id": "getting-started",
                "children": [{ "title": "Step One", "id": "step-one" }]
            })
        );
    }

    #[test]
    fn test_annotation_is_spread() {
        let mut annotation = Map::new();
        annotation.insert("tag".into(), json!("GET"));
        annotation.insert("title".into(), json!("Override"));
        let section = Section::leaf("List", "list").with_annotation(annotation);

        let value = section.to_export_value();
        assert_eq!(value["tag"], "GET");
        assert_eq!(value["title"], "Override");
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_from_export_value() {
        let value = json!({
            "title": "Advanced",
            "id": "advanced",
            "children": [{ "title": "Tuning", "id": "tuning", "label": "beta" }]
        });

        let section = Section::from_export_value(&value).unwrap();
        assert_eq!(section.title, "Advanced");
        let children = section.children.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].annotation["label"], "beta");
        assert!(children[0].children.is_none());
    }

    #[test]
    fn test_serde_uses_export_shape() {
        let mut annotation = Map::new();
        annotation.insert("tag".into(), json!("GET"));
        let mut section = Section::top("List", "list").with_annotation(annotation);
        section
            .children
            .as_mut()
            .unwrap()
            .push(Section::leaf("Sub", "sub"));

        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value, section.to_export_value());
        assert_eq!(value["tag"], "GET");
        assert!(value.get("annotation").is_none());

        let back: Section = serde_json::from_value(value).unwrap();
        assert_eq!(back, section);
        assert!(serde_json::from_value::<Section>(json!({ "id": "x" })).is_err());
    }

    #[test]
    fn test_from_export_value_rejects_bad_shape() {
        assert!(Section::from_export_value(&json!({ "title": "x" })).is_none());
        assert!(Section::from_export_value(&json!([1, 2])).is_none());
    }
}
