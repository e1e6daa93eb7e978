use serde_json::Value;
use thingview_common::ThingDescription;

use super::{Capability, LEVEL_SLOT, ON_SLOT, bind_slots, on_state, toggle};

/// A dimmer: on/off plus a level, usually a percentage.
#[derive(Debug, Default)]
pub struct MultiLevelSwitch {
    on_property: Option<String>,
    level_property: Option<String>,
    on: Option<bool>,
    level: Option<f64>,
}

impl Capability for MultiLevelSwitch {
    fn find_properties(&mut self, description: &ThingDescription) {
        let [on, level] = bind_slots(description, [ON_SLOT, LEVEL_SLOT]);
        self.on_property = on;
        self.level_property = level;
    }

    fn update_property(&mut self, name: &str, value: Option<&Value>) {
        if self.on_property.as_deref() == Some(name) {
            self.on = value.and_then(Value::as_bool);
        } else if self.level_property.as_deref() == Some(name) {
            self.level = value.and_then(Value::as_f64);
        }
    }

    fn icon_view(&self) -> String {
        let level = match self.level {
            Some(level) => format!(r#" data-level="{}">{}%"#, level.round(), level.round()),
            None => ">".to_owned(),
        };

        format!(
            r#"<webthing-multi-level-switch-capability data-state="{}"{level}</webthing-multi-level-switch-capability>"#,
            on_state(self.on)
        )
    }

    fn click(&self) -> Option<(&str, Value)> {
        toggle(self.on_property.as_ref(), self.on)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::thing::{ThingVariant, tests::thing};

    #[test]
    fn dimmer() {
        let mut thing = thing(
            json!({
                "id": "dimmer",
                "type": "dimmableLight",
                "properties": {
                    "on": { "type": "boolean", "href": "/p/on" },
                    "brightness": { "type": "integer", "@type": "BrightnessProperty", "minimum": 0, "maximum": 100, "href": "/p/brightness" },
                },
            }),
            json!({ "on": true, "brightness": 40 }),
        );

        let ThingVariant::MultiLevelSwitch(dimmer) = thing.variant() else {
            panic!("expected a multi-level switch");
        };
        assert_eq!(dimmer.level_property.as_deref(), Some("brightness"));
        assert!(thing.icon_view().contains(r#"data-state="on" data-level="40">40%"#));

        let write = thing.set_input("brightness", "75").unwrap();
        assert!(!thing.icon_view().contains("data-level"));

        thing.complete_write(&write, Ok(json!(75)));
        assert!(thing.icon_view().contains(">75%<"));

        let write = thing.click().unwrap();
        assert_eq!((write.property.as_str(), write.value), ("on", json!(false)));
    }
}
