use serde_json::Value;
use thingview_common::ThingDescription;

use super::{Capability, ON_SLOT, bind_slots, on_state, toggle};

#[derive(Debug, Default)]
pub struct OnOffSwitch {
    on_property: Option<String>,
    on: Option<bool>,
}

impl Capability for OnOffSwitch {
    fn find_properties(&mut self, description: &ThingDescription) {
        let [on] = bind_slots(description, [ON_SLOT]);
        self.on_property = on;
    }

    fn update_property(&mut self, name: &str, value: Option<&Value>) {
        if self.on_property.as_deref() == Some(name) {
            self.on = value.and_then(Value::as_bool);
        }
    }

    fn icon_view(&self) -> String {
        format!(
            r#"<webthing-on-off-switch-capability data-state="{}"></webthing-on-off-switch-capability>"#,
            on_state(self.on)
        )
    }

    fn click(&self) -> Option<(&str, Value)> {
        toggle(self.on_property.as_ref(), self.on)
    }
}
