use serde_json::Value;
use thingview_common::{
    DomId, PropertyDescriptor, PropertyType, capabilities::light::Color,
    capabilities::semantic, display_value, utils::escape_html,
};

use super::{container, unit_span};
use crate::dom::{EventKind, EventTarget};

/// The kind of control a writable property is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Switch,
    Level,
    Color,
    ColorTemperature,
    Checkbox,
    Number,
    Text,
}

impl Control {
    pub fn for_descriptor(descriptor: &PropertyDescriptor) -> Self {
        let kind = descriptor.kind;

        let annotated = descriptor.semantics.iter().find_map(|annotation| {
            match annotation.as_str() {
                semantic::ON_OFF if kind == PropertyType::Boolean => Some(Self::Switch),
                semantic::LEVEL | semantic::BRIGHTNESS if kind.is_numeric() => Some(Self::Level),
                semantic::COLOR => Some(Self::Color),
                semantic::COLOR_TEMPERATURE if kind.is_numeric() => Some(Self::ColorTemperature),
                _ => None,
            }
        });

        annotated.unwrap_or(match kind {
            PropertyType::Boolean => Self::Checkbox,
            PropertyType::Number | PropertyType::Integer => Self::Number,
            _ => Self::Text,
        })
    }

    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Level => "level",
            Self::Color => "color",
            Self::ColorTemperature => "color-temperature",
            Self::Checkbox => "checkbox",
            Self::Number => "number",
            Self::Text => "string",
        }
    }

    pub const fn class(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Level => "level",
            Self::Color => "color-light-color",
            Self::ColorTemperature => "color-temperature",
            Self::Checkbox => "boolean-switch",
            Self::Number => "number-input",
            Self::Text => "string-input",
        }
    }

    const fn is_toggle(self) -> bool {
        matches!(self, Self::Switch | Self::Checkbox)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommitError {
    #[error("{raw:?} is not a valid {kind}")]
    Unparseable { raw: String, kind: PropertyType },
    #[error("{value} is outside the allowed range")]
    OutOfBounds { value: Value },
    #[error("a write is still in flight")]
    Pending,
}

#[derive(Debug)]
pub struct InputDetail {
    name: String,
    descriptor: PropertyDescriptor,
    control: Control,
    id: DomId,
    /// Text currently in the control. Toggles hold `true` or `false`.
    raw: String,
    pending: bool,
    listeners: EventTarget,
}

impl InputDetail {
    pub fn new(name: &str, descriptor: &PropertyDescriptor) -> Self {
        let control = Control::for_descriptor(descriptor);

        Self {
            name: name.to_owned(),
            descriptor: descriptor.clone(),
            control,
            id: DomId::new(control.id_prefix(), name),
            raw: String::new(),
            pending: false,
            listeners: EventTarget::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn id(&self) -> &DomId {
        &self.id
    }

    pub fn listeners(&self) -> &EventTarget {
        &self.listeners
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn get_value(&self) -> &str {
        &self.raw
    }

    /// Replaces the control's text, as a user typing would.
    pub fn set_value(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.raw = checked.to_string();
    }

    pub fn attach(&mut self) {
        if !self.listeners.is_empty() {
            return;
        }

        if self.control.is_toggle() {
            self.listeners.add(EventKind::Click);
        } else {
            self.listeners.add(EventKind::Change);
            self.listeners.add(EventKind::KeyUp);
            self.listeners.add(EventKind::Blur);
        }
    }

    /// Parses what the user entered. Nothing changes if it is rejected.
    pub fn commit(&self) -> Result<Value, CommitError> {
        if self.pending {
            return Err(CommitError::Pending);
        }

        let unparseable = || CommitError::Unparseable {
            raw: self.raw.clone(),
            kind: self.descriptor.kind,
        };

        let value = match self.control {
            Control::Color => {
                let color = self.raw.trim().parse::<Color>().map_err(|_| unparseable())?;
                Value::String(color.to_string())
            }
            _ => self.descriptor.kind.coerce(&self.raw).ok_or_else(unparseable)?,
        };

        if !self.descriptor.in_bounds(&value) {
            return Err(CommitError::OutOfBounds { value });
        }

        Ok(value)
    }

    pub fn update(&mut self, value: Option<&Value>) {
        let Some(value) = value else {
            self.raw.clear();
            self.pending = true;
            return;
        };

        self.raw = match (self.control.is_toggle(), value.as_bool()) {
            (true, Some(checked)) => checked.to_string(),
            _ => display_value(value),
        };
        self.pending = false;
    }

    pub fn view(&self) -> String {
        let id = &self.id;
        let class = self.control.class();
        let disabled = if self.pending { " disabled" } else { "" };
        let checked = if self.raw == "true" { " checked" } else { "" };
        let value = escape_html(&self.raw);
        let desc = &self.descriptor;

        let input = match self.control {
            Control::Switch => {
                format!(r#"<input type="checkbox" id="{id}" class="{class}"{checked}{disabled}>"#)
            }
            Control::Checkbox => format!(
                r#"<input type="checkbox" id="{id}" class="{class}"{checked}{disabled}><label for="{id}"></label>"#
            ),
            Control::Level | Control::ColorTemperature => {
                let (min, max) = match self.control {
                    Control::Level => (0.0, 100.0),
                    _ => (2700.0, 6500.0),
                };
                format!(
                    r#"<input type="range" id="{id}" class="{class}" min="{}" max="{}" value="{value}"{disabled}>{}"#,
                    desc.minimum.unwrap_or(min),
                    desc.maximum.unwrap_or(max),
                    unit_span(desc.unit.as_deref()),
                )
            }
            Control::Color => {
                format!(r#"<input type="color" id="{id}" class="{class}" value="{value}"{disabled}>"#)
            }
            Control::Number => {
                let step = if desc.kind == PropertyType::Integer { "1" } else { "any" };
                let min = desc.minimum.map(|min| format!(r#" min="{min}""#)).unwrap_or_default();
                let max = desc.maximum.map(|max| format!(r#" max="{max}""#)).unwrap_or_default();
                format!(
                    r#"<input type="number" id="{id}" class="{class}" step="{step}"{min}{max} value="{value}"{disabled}>{}"#,
                    unit_span(desc.unit.as_deref()),
                )
            }
            Control::Text => {
                format!(r#"<input type="text" id="{id}" class="{class}" value="{value}"{disabled}>"#)
            }
        };

        container(desc.label_or(&self.name), &input)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(name: &str, value: Value) -> InputDetail {
        let descriptor = serde_json::from_value::<PropertyDescriptor>(value).unwrap();
        InputDetail::new(name, &descriptor)
    }

    #[test]
    fn controls_and_ids() {
        let cases = [
            (json!({ "type": "boolean" }), Control::Checkbox, "checkbox-spaced_prop", "boolean-switch"),
            (json!({ "type": "number" }), Control::Number, "number-spaced_prop", "number-input"),
            (json!({ "type": "integer" }), Control::Number, "number-spaced_prop", "number-input"),
            (json!({ "type": "string" }), Control::Text, "string-spaced_prop", "string-input"),
            (json!({ "type": "object" }), Control::Text, "string-spaced_prop", "string-input"),
            (json!({}), Control::Text, "string-spaced_prop", "string-input"),
            (
                json!({ "type": "boolean", "@type": "OnOffProperty" }),
                Control::Switch,
                "switch-spaced_prop",
                "switch",
            ),
            (
                json!({ "type": "integer", "@type": "BrightnessProperty" }),
                Control::Level,
                "level-spaced_prop",
                "level",
            ),
            (
                json!({ "type": "string", "@type": "ColorProperty" }),
                Control::Color,
                "color-spaced_prop",
                "color-light-color",
            ),
            (
                json!({ "type": "integer", "@type": "ColorTemperatureProperty" }),
                Control::ColorTemperature,
                "color-temperature-spaced_prop",
                "color-temperature",
            ),
        ];

        for (descriptor, control, id, class) in cases {
            let detail = input("spaced prop", descriptor);
            assert_eq!(detail.control(), control);
            assert_eq!(detail.id().as_str(), id);
            assert_eq!(control.class(), class);
            assert!(detail.view().contains(&format!(r#"id="{id}" class="{class}""#)));
        }
    }

    #[test]
    fn number_view() {
        let mut detail = input("numberProp", json!({ "type": "number", "unit": "percent" }));
        detail.update(Some(&json!(10)));

        let view = detail.view();
        assert!(view.contains(r#"step="any""#));
        assert!(view.contains(r#"value="10""#));
        assert!(view.contains("percent"));
        assert!(!view.contains("min="));

        let detail = input("n", json!({ "type": "integer", "minimum": 0, "maximum": 100 }));
        let view = detail.view();
        assert!(view.contains(r#"step="1" min="0" max="100""#));
    }

    #[test]
    fn commit_number() {
        let mut detail = input("n", json!({ "type": "integer", "minimum": 0, "maximum": 100 }));

        detail.set_value("20");
        assert_eq!(detail.commit(), Ok(json!(20)));

        detail.set_value("101");
        assert_eq!(detail.commit(), Err(CommitError::OutOfBounds { value: json!(101) }));

        detail.set_value("2.5");
        assert!(matches!(detail.commit(), Err(CommitError::Unparseable { .. })));

        detail.set_value("");
        assert!(matches!(detail.commit(), Err(CommitError::Unparseable { .. })));
    }

    #[test]
    fn commit_color() {
        let mut detail = input("color", json!({ "type": "string", "@type": "ColorProperty" }));

        detail.set_value("#FF8800");
        assert_eq!(detail.commit(), Ok(json!("#ff8800")));

        detail.set_value("orange");
        assert!(detail.commit().is_err());
    }

    #[test]
    fn commit_checkbox() {
        let mut detail = input("flag", json!({ "type": "boolean" }));

        detail.update(Some(&json!(false)));
        assert_eq!(detail.get_value(), "false");
        assert!(!detail.view().contains("checked"));

        detail.set_checked(true);
        assert_eq!(detail.commit(), Ok(json!(true)));
        assert!(detail.view().contains(" checked"));
    }

    #[test]
    fn commit_object_text() {
        let mut detail = input("obj", json!({ "type": "object" }));

        detail.set_value(r#"{"x": 1}"#);
        assert_eq!(detail.commit(), Ok(json!({ "x": 1 })));

        detail.set_value("not json");
        assert!(detail.commit().is_err());
    }

    #[test]
    fn transition_state() {
        let mut detail = input("s", json!({ "type": "string" }));
        detail.update(Some(&json!("bar")));

        detail.update(None);
        assert!(detail.is_pending());
        assert_eq!(detail.get_value(), "");
        assert!(detail.view().contains(" disabled"));
        assert_eq!(detail.commit(), Err(CommitError::Pending));

        detail.update(Some(&json!("baz")));
        assert!(!detail.is_pending());
        assert_eq!(detail.get_value(), "baz");
    }

    #[test]
    fn attach_once() {
        let mut detail = input("s", json!({ "type": "string" }));

        detail.attach();
        detail.attach();

        assert_eq!(detail.listeners().count(EventKind::Change), 1);
        assert_eq!(detail.listeners().len(), 3);
    }

    #[test]
    fn escapes_values() {
        let mut detail = input("s", json!({ "type": "string", "title": "<b>" }));
        detail.update(Some(&json!(r#"a"b"#)));

        let view = detail.view();
        assert!(view.contains(r#"value="a&quot;b""#));
        assert!(view.contains("&lt;b&gt;"));
    }
}
