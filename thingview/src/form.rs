//! Input forms generated from an action's input schema.
//!
//! Fields are laid out in name order. What a field renders as and how its
//! text turns into a value is looked up by declared type; anything without
//! an entry is free text.

use serde_json::{Map, Value, json};
use thingview_common::{
    ActionDescription, ActionSchema, DomId, FieldSchema, PropertyType,
    utils::{escape_html, escape_html_for_id_class},
};

use crate::dom::{EventKind, EventTarget};

/// Name of the single field synthesized for a bare-value schema.
pub const DEFAULT_FIELD: &str = "__default__";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    MissingRequired(String),
    #[error("{raw:?} is not a valid value for {field}")]
    Invalid { field: String, raw: String },
    #[error("{value} is out of range for {field}")]
    OutOfBounds { field: String, value: Value },
    #[error("no field named {0}")]
    UnknownField(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    name: String,
    schema: FieldSchema,
    required: bool,
    raw: String,
    checked: bool,
}

impl FormField {
    fn new(name: &str, schema: &FieldSchema, required: bool) -> Self {
        Self {
            name: name.to_owned(),
            schema: schema.clone(),
            // an unchecked box still submits `false`
            required: required && schema.kind != PropertyType::Boolean,
            raw: String::new(),
            checked: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyType {
        self.schema.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_checkbox(&self) -> bool {
        self.schema.kind == PropertyType::Boolean
    }

    pub fn value(&self) -> &str {
        &self.raw
    }

    pub fn set_value(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    fn html_name(&self) -> String {
        escape_html_for_id_class(&self.name)
    }

    fn invalid(&self) -> FormError {
        FormError::Invalid { field: self.name.clone(), raw: self.raw.clone() }
    }
}

struct FieldStrategy {
    render: fn(&FormField) -> String,
    /// `Ok(None)` leaves the field out of the payload.
    coerce: fn(&FormField) -> Result<Option<Value>, FormError>,
}

const NUMBER: FieldStrategy = FieldStrategy { render: render_number, coerce: coerce_number };
const CHECKBOX: FieldStrategy = FieldStrategy { render: render_checkbox, coerce: coerce_checkbox };
const TEXT: FieldStrategy = FieldStrategy { render: render_text, coerce: coerce_text };

const STRATEGIES: &[(PropertyType, FieldStrategy)] = &[
    (PropertyType::Number, NUMBER),
    (PropertyType::Integer, NUMBER),
    (PropertyType::Boolean, CHECKBOX),
];

fn strategy(kind: PropertyType) -> &'static FieldStrategy {
    STRATEGIES
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or(&TEXT, |(_, strategy)| strategy)
}

fn required_attr(field: &FormField) -> &'static str {
    if field.required { " required" } else { "" }
}

fn render_number(field: &FormField) -> String {
    let schema = &field.schema;
    let step = if schema.kind == PropertyType::Integer { "1" } else { "any" };
    let min = schema.minimum.map(|min| format!(r#" min="{min}""#)).unwrap_or_default();
    let max = schema.maximum.map(|max| format!(r#" max="{max}""#)).unwrap_or_default();

    // spinners only make sense over a closed range
    let spinner = match (schema.minimum, schema.maximum) {
        (Some(_), Some(_)) => "",
        _ => " hide-number-spinner",
    };

    format!(
        r#"<input type="number" name="{}" step="{step}"{min}{max} class="action-input-number{spinner}"{} value="{}">"#,
        field.html_name(),
        required_attr(field),
        escape_html(&field.raw),
    )
}

fn coerce_number(field: &FormField) -> Result<Option<Value>, FormError> {
    if field.is_empty() {
        return Ok(None);
    }

    let value = field.schema.kind.coerce(&field.raw).ok_or_else(|| field.invalid())?;

    let n = value.as_f64().unwrap_or_default();
    let in_range = field.schema.minimum.is_none_or(|min| n >= min)
        && field.schema.maximum.is_none_or(|max| n <= max);
    if !in_range {
        return Err(FormError::OutOfBounds { field: field.name.clone(), value });
    }

    Ok(Some(value))
}

fn render_checkbox(field: &FormField) -> String {
    let name = field.html_name();
    let id = DomId::new("checkbox", &field.name);
    let checked = if field.checked { " checked" } else { "" };

    format!(
        r#"<span><input type="checkbox" name="{name}" class="action-input-checkbox" id="{id}"{checked}><label for="{id}"></label></span>"#
    )
}

fn coerce_checkbox(field: &FormField) -> Result<Option<Value>, FormError> {
    Ok(Some(Value::Bool(field.checked)))
}

fn render_text(field: &FormField) -> String {
    format!(
        r#"<input type="text" name="{}" class="action-input-string"{} value="{}">"#,
        field.html_name(),
        required_attr(field),
        escape_html(&field.raw),
    )
}

fn coerce_text(field: &FormField) -> Result<Option<Value>, FormError> {
    if field.is_empty() {
        return Ok(None);
    }

    Ok(Some(Value::String(field.raw.clone())))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// No input schema; the action is invoked with an empty body.
    Bare,
    Single,
    Object,
}

/// An action invocation ready to be posted.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub action: String,
    pub href: String,
    pub body: Value,
}

#[derive(Debug)]
pub struct ActionInputForm {
    action: String,
    label: String,
    shape: Shape,
    fields: Vec<FormField>,
    listeners: EventTarget,
}

impl ActionInputForm {
    pub fn new(action: &str, description: &ActionDescription) -> Self {
        let (shape, fields) = match &description.input {
            None => (Shape::Bare, Vec::new()),
            Some(ActionSchema::Single(schema)) => {
                (Shape::Single, vec![FormField::new(DEFAULT_FIELD, schema, true)])
            }
            Some(ActionSchema::Object { fields, required }) => {
                let mut names = fields.keys().collect::<Vec<_>>();
                names.sort();

                let fields = names
                    .into_iter()
                    .map(|name| FormField::new(name, &fields[name], required.contains(name)))
                    .collect();

                (Shape::Object, fields)
            }
        };

        Self {
            action: action.to_owned(),
            label: description.label_or(action).to_owned(),
            shape,
            fields,
            listeners: EventTarget::default(),
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    pub fn listeners(&self) -> &EventTarget {
        &self.listeners
    }

    /// Fills a field from text. Checkboxes take `true`/`on` or
    /// `false`/`off`; for a bare-value schema the name is ignored.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let field = match self.shape {
            Shape::Single => self.fields.first_mut(),
            _ => self.field_mut(name),
        }
        .ok_or_else(|| FormError::UnknownField(name.to_owned()))?;

        if field.is_checkbox() {
            let checked = PropertyType::Boolean
                .coerce(raw)
                .and_then(|value| value.as_bool())
                .ok_or_else(|| FormError::Invalid { field: name.to_owned(), raw: raw.to_owned() })?;
            field.set_checked(checked);
        } else {
            field.set_value(raw);
        }

        Ok(())
    }

    pub fn attach(&mut self) {
        if self.listeners.is_empty() {
            let kind = match self.shape {
                Shape::Bare => EventKind::Click,
                _ => EventKind::Submit,
            };
            self.listeners.add(kind);
        }
    }

    pub fn view(&self) -> String {
        let action = escape_html(&self.action);
        let label = escape_html(&self.label);

        if self.shape == Shape::Bare {
            return format!(
                r#"<div class="action-input"><button class="action-button text-button" value="{action}">{label}</button></div>"#
            );
        }

        let mut html = format!(
            r#"<div class="action-input"><div class="action-input-title">{label}</div><form class="action-input-form">"#
        );

        for field in &self.fields {
            let title = match self.shape {
                Shape::Single => String::new(),
                _ => escape_html(field.schema.title.as_deref().unwrap_or(&field.name)),
            };
            let unit = field.schema.unit.as_deref().map(escape_html).unwrap_or_default();

            html.push_str(&format!(r#"<span class="action-input-name">{title}</span>"#));
            html.push_str(&(strategy(field.kind()).render)(field));
            html.push_str(&format!(r#"<span class="action-input-unit">{unit}</span>"#));
        }

        html.push_str(&format!(
            r#"<input id="action-submit-button" type="submit" class="action-button text-button" value="{action}"></form></div>"#
        ));

        html
    }

    /// Assembles the input from whatever has been entered. Empty fields are
    /// left out; checkboxes always contribute.
    pub fn payload(&self) -> Result<Option<Value>, FormError> {
        match self.shape {
            Shape::Bare => Ok(None),
            Shape::Single => match self.fields.first() {
                Some(field) => (strategy(field.kind()).coerce)(field),
                None => Ok(None),
            },
            Shape::Object => {
                let mut input = Map::new();
                for field in &self.fields {
                    if let Some(value) = (strategy(field.kind()).coerce)(field)? {
                        input.insert(field.name.clone(), value);
                    }
                }
                Ok(Some(Value::Object(input)))
            }
        }
    }

    /// Checks required fields, then builds the request for `href`.
    pub fn submit(&self, href: &str) -> Result<ActionRequest, FormError> {
        if let Some(missing) = self.fields.iter().find(|field| field.required && field.is_empty()) {
            return Err(FormError::MissingRequired(missing.name.clone()));
        }

        let invocation = match self.payload()? {
            Some(input) => json!({ "input": input }),
            None => json!({}),
        };

        let mut body = Map::new();
        body.insert(self.action.clone(), invocation);

        Ok(ActionRequest {
            action: self.action.clone(),
            href: href.to_owned(),
            body: Value::Object(body),
        })
    }
}
