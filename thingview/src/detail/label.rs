use serde_json::Value;
use thingview_common::{DomId, PropertyDescriptor, display_value, utils::escape_html};

use super::{container, unit_span};

/// Shown in place of a value while it is in transition.
pub const TRANSITION_TEXT: &str = "...";

/// Read-only property. Never writes.
#[derive(Debug)]
pub struct LabelDetail {
    name: String,
    descriptor: PropertyDescriptor,
    id: DomId,
    text: String,
}

impl LabelDetail {
    pub fn new(name: &str, descriptor: &PropertyDescriptor) -> Self {
        Self {
            name: name.to_owned(),
            descriptor: descriptor.clone(),
            id: DomId::new("label", name),
            text: TRANSITION_TEXT.to_owned(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn update(&mut self, value: Option<&Value>) {
        self.text = match value {
            Some(value) => display_value(value),
            None => TRANSITION_TEXT.to_owned(),
        };
    }

    pub fn view(&self) -> String {
        let label = format!(
            r#"<div id="{}" class="generic-label"><span class="generic-label-value">{}</span>{}</div>"#,
            self.id,
            escape_html(&self.text),
            unit_span(self.descriptor.unit.as_deref()),
        );

        container(self.descriptor.label_or(&self.name), &label)
    }
}
