//! Thing descriptions as served by the gateway.
//!
//! Descriptions are read-only once loaded; a structural change on the device
//! means fetching a new description.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{PropertyType, ThingId};

pub mod media_types {
    pub const DASH: &str = "application/dash+xml";
    pub const HLS: &str = "application/vnd.apple.mpegurl";
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingDescription {
    pub id: ThingId,
    pub name: Option<String>,
    pub title: Option<String>,
    /// Legacy type tag, e.g. `onOffSwitch` or `thing`.
    #[serde(rename = "type")]
    pub type_tag: Option<String>,
    #[serde(rename = "@type", default, deserialize_with = "one_or_many")]
    pub capabilities: Vec<String>,
    pub selected_capability: Option<String>,
    pub description: Option<String>,
    pub href: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDescriptor>,
    #[serde(default)]
    pub actions: IndexMap<String, ActionDescription>,
    #[serde(default, deserialize_with = "links")]
    pub links: Vec<Link>,
}

impl ThingDescription {
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(self.id.as_str())
    }

    /// Whether any property carries the annotation or, failing that, the name.
    pub fn has_property(&self, semantic: &str, name: &str) -> bool {
        self.properties
            .iter()
            .any(|(prop_name, prop)| prop.has_semantic(semantic) || prop_name == name)
    }

    /// Invocation endpoint of an action, defaulting to `<href>/actions/<name>`.
    pub fn action_href(&self, name: &str) -> Option<String> {
        let action = self.actions.get(name)?;

        action
            .invocation_href()
            .map(str::to_owned)
            .or_else(|| self.href.as_ref().map(|href| format!("{href}/actions/{name}")))
    }

    /// Endpoint listing the current value of every property.
    pub fn properties_href(&self) -> Option<String> {
        self.links
            .iter()
            .find(|link| link.rel.as_deref() == Some("properties"))
            .map(|link| link.href.clone())
            .or_else(|| self.href.as_ref().map(|href| format!("{href}/properties")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
    /// Semantic annotations, e.g. `OnOffProperty`.
    #[serde(rename = "@type", default, deserialize_with = "one_or_many")]
    pub semantics: Vec<String>,
    pub title: Option<String>,
    pub label: Option<String>,
    pub unit: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    #[serde(default)]
    pub read_only: bool,
    pub href: Option<String>,
    #[serde(default, deserialize_with = "links")]
    pub links: Vec<Link>,
}

impl PropertyDescriptor {
    pub fn label_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.title
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or(name)
    }

    pub fn has_semantic(&self, semantic: &str) -> bool {
        self.semantics.iter().any(|annotation| annotation == semantic)
    }

    /// Where writes go: `href`, or a `property` link.
    pub fn write_href(&self) -> Option<&str> {
        self.href.as_deref().or_else(|| {
            self.links
                .iter()
                .find(|link| link.rel.as_deref() == Some("property"))
                .map(|link| link.href.as_str())
        })
    }

    pub fn image_href(&self) -> Option<&str> {
        self.alternate(|media_type| media_type.starts_with("image/"))
    }

    pub fn dash_href(&self) -> Option<&str> {
        self.alternate(|media_type| media_type == media_types::DASH)
    }

    pub fn hls_href(&self) -> Option<&str> {
        self.alternate(|media_type| media_type == media_types::HLS)
    }

    fn alternate(&self, matches: impl Fn(&str) -> bool) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.is_alternate() && link.media_type.as_deref().is_some_and(&matches))
            .map(|link| link.href.as_str())
    }

    /// Whether `value` lies within the declared bounds. Non-numbers always do.
    pub fn in_bounds(&self, value: &Value) -> bool {
        let Some(n) = value.as_f64() else {
            return true;
        };

        self.minimum.is_none_or(|min| n >= min) && self.maximum.is_none_or(|max| n <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
}

impl Link {
    pub fn is_alternate(&self) -> bool {
        self.rel.as_deref() == Some("alternate")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionDescription {
    pub title: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub input: Option<ActionSchema>,
    pub href: Option<String>,
    #[serde(default, deserialize_with = "links")]
    pub links: Vec<Link>,
}

impl ActionDescription {
    pub fn label_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.title
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or(name)
    }

    pub fn invocation_href(&self) -> Option<&str> {
        self.href.as_deref().or_else(|| {
            self.links
                .iter()
                .find(|link| link.rel.as_deref() == Some("action"))
                .map(|link| link.href.as_str())
        })
    }
}

/// Input schema of an action. Only used to generate a form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSchema")]
pub enum ActionSchema {
    Object {
        fields: IndexMap<String, FieldSchema>,
        required: Vec<String>,
    },
    /// A schema describing one bare value.
    Single(FieldSchema),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
    pub title: Option<String>,
    pub unit: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Deserialize)]
struct RawSchema {
    #[serde(flatten)]
    field: FieldSchema,
    #[serde(default)]
    properties: IndexMap<String, FieldSchema>,
    #[serde(default)]
    required: Value,
}

impl From<RawSchema> for ActionSchema {
    fn from(raw: RawSchema) -> Self {
        if raw.field.kind != PropertyType::Object {
            return ActionSchema::Single(raw.field);
        }

        let required = match raw.required {
            Value::Array(names) => names
                .into_iter()
                .filter_map(|name| match name {
                    Value::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        ActionSchema::Object { fields: raw.properties, required }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(one) => vec![one],
        OneOrMany::Many(many) => many,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// Links without an `href` point nowhere and are dropped.
fn links<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Link>, D::Error> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawLink {
        href: Option<String>,
        rel: Option<String>,
        media_type: Option<String>,
    }

    let raw = Option::<Vec<RawLink>>::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|link| {
            Some(Link { href: link.href?, rel: link.rel, media_type: link.media_type })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_description() {
        let desc = serde_json::from_value::<ThingDescription>(json!({
            "id": "UnknownThings",
            "name": "foofoo",
            "type": "thing",
            "href": "/things/UnknownThings",
            "properties": {
                "numberProp": { "value": 10, "type": "number", "unit": "percent" },
                "stringProp": { "value": "bar", "type": "string" },
                "booleanProp": { "value": true, "type": "boolean" },
            },
        }))
        .unwrap();

        assert_eq!(desc.id.as_str(), "UnknownThings");
        assert_eq!(desc.display_name(), "foofoo");
        assert_eq!(desc.type_tag.as_deref(), Some("thing"));
        assert!(desc.capabilities.is_empty());
        assert_eq!(
            desc.properties.keys().collect::<Vec<_>>(),
            ["numberProp", "stringProp", "booleanProp"]
        );
        assert_eq!(desc.properties["numberProp"].kind, PropertyType::Number);
        assert_eq!(desc.properties["numberProp"].unit.as_deref(), Some("percent"));
        assert_eq!(desc.properties_href().as_deref(), Some("/things/UnknownThings/properties"));
    }

    #[test]
    fn single_capability_string() {
        let desc = serde_json::from_value::<ThingDescription>(json!({
            "id": "lamp",
            "title": "Lamp",
            "name": "lamp-legacy",
            "@type": "Light",
        }))
        .unwrap();

        assert_eq!(desc.capabilities, ["Light"]);
        assert_eq!(desc.display_name(), "Lamp");
    }

    #[test]
    fn property_links() {
        let prop = serde_json::from_value::<PropertyDescriptor>(json!({
            "type": "null",
            "readOnly": true,
            "links": [
                { "rel": "property", "href": "/things/cam/properties/snapshot" },
                { "rel": "alternate", "mediaType": "image/jpeg", "href": "/media/cam/snap.jpg" },
                { "rel": "alternate", "mediaType": "application/dash+xml", "href": "/media/cam/index.mpd" },
                { "rel": "alternate", "mediaType": "application/vnd.apple.mpegurl", "href": "/media/cam/index.m3u8" },
            ],
        }))
        .unwrap();

        assert_eq!(prop.kind, PropertyType::Unknown);
        assert!(prop.read_only);
        assert_eq!(prop.write_href(), Some("/things/cam/properties/snapshot"));
        assert_eq!(prop.image_href(), Some("/media/cam/snap.jpg"));
        assert_eq!(prop.dash_href(), Some("/media/cam/index.mpd"));
        assert_eq!(prop.hls_href(), Some("/media/cam/index.m3u8"));
    }

    #[test]
    fn annotation_list() {
        let desc = serde_json::from_value::<ThingDescription>(json!({
            "id": "plug",
            "properties": {
                "power": { "type": "boolean", "@type": ["OnOffProperty"] },
                "watts": { "type": "number", "@type": null },
            },
        }))
        .unwrap();

        assert_eq!(desc.properties["power"].semantics, ["OnOffProperty"]);
        assert!(desc.properties["power"].has_semantic("OnOffProperty"));
        assert!(desc.properties["watts"].semantics.is_empty());
        assert!(desc.has_property("OnOffProperty", "on"));
    }

    #[test]
    fn links_without_href_are_dropped() {
        let desc = serde_json::from_value::<ThingDescription>(json!({
            "id": "cam",
            "href": "/things/cam",
            "links": [{ "rel": "properties" }],
            "properties": {
                "snapshot": {
                    "readOnly": true,
                    "links": [
                        { "rel": "alternate", "mediaType": "image/jpeg" },
                        { "rel": "alternate", "mediaType": "image/png", "href": "/media/cam/snap.png" },
                    ],
                },
            },
        }))
        .unwrap();

        assert!(desc.links.is_empty());
        assert_eq!(desc.properties_href().as_deref(), Some("/things/cam/properties"));
        assert_eq!(desc.properties["snapshot"].links.len(), 1);
        assert_eq!(desc.properties["snapshot"].image_href(), Some("/media/cam/snap.png"));
    }

    #[test]
    fn bounds() {
        let prop = PropertyDescriptor {
            kind: PropertyType::Integer,
            minimum: Some(0.0),
            maximum: Some(100.0),
            ..Default::default()
        };

        assert!(prop.in_bounds(&json!(0)));
        assert!(prop.in_bounds(&json!(100)));
        assert!(!prop.in_bounds(&json!(101)));
        assert!(!prop.in_bounds(&json!(-1)));
        assert!(prop.in_bounds(&json!("text")));
    }

    #[test]
    fn object_schema() {
        let schema = serde_json::from_value::<ActionSchema>(json!({
            "type": "object",
            "properties": {
                "b": { "type": "string" },
                "a": { "type": "boolean" },
            },
            "required": ["b", 3],
        }))
        .unwrap();

        let ActionSchema::Object { fields, required } = schema else {
            panic!("expected an object schema");
        };

        assert_eq!(fields.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(fields["a"].kind, PropertyType::Boolean);
        assert_eq!(required, ["b"]);
    }

    #[test]
    fn malformed_required_is_ignored() {
        let schema = serde_json::from_value::<ActionSchema>(json!({
            "type": "object",
            "properties": { "a": { "type": "number" } },
            "required": "a",
        }))
        .unwrap();

        assert!(matches!(schema, ActionSchema::Object { required, .. } if required.is_empty()));
    }

    #[test]
    fn single_schema() {
        let schema = serde_json::from_value::<ActionSchema>(json!({
            "type": "integer",
            "minimum": 0,
            "maximum": 10,
            "unit": "seconds",
        }))
        .unwrap();

        assert_eq!(
            schema,
            ActionSchema::Single(FieldSchema {
                kind: PropertyType::Integer,
                title: None,
                unit: Some("seconds".to_owned()),
                minimum: Some(0.0),
                maximum: Some(10.0),
            })
        );
    }

    #[test]
    fn action_hrefs() {
        let desc = serde_json::from_value::<ThingDescription>(json!({
            "id": "fan",
            "href": "/things/fan",
            "actions": {
                "spin": { "input": { "type": "number" } },
                "stop": { "href": "/things/fan/actions/halt" },
            },
        }))
        .unwrap();

        assert_eq!(desc.action_href("spin").as_deref(), Some("/things/fan/actions/spin"));
        assert_eq!(desc.action_href("stop").as_deref(), Some("/things/fan/actions/halt"));
        assert_eq!(desc.action_href("missing"), None);
    }
}
