use serde_json::Value;
use thingview_common::{
    ThingDescription,
    capabilities::light::Color,
    utils::color_temperature_to_rgb,
};

use super::{
    COLOR_SLOT, COLOR_TEMPERATURE_SLOT, Capability, ON_SLOT, bind_slots, on_state, toggle,
};

fn color_attr(color: Option<Color>) -> String {
    color.map(|color| format!(r#" data-color="{color}""#)).unwrap_or_default()
}

fn temperature_color(value: Option<&Value>) -> Option<Color> {
    value.and_then(Value::as_f64).map(color_temperature_to_rgb)
}

/// A light with a full color, and possibly a color temperature as well.
/// The swatch follows whichever of the two changed last.
#[derive(Debug, Default)]
pub struct ColorControl {
    on_property: Option<String>,
    color_property: Option<String>,
    temperature_property: Option<String>,
    on: Option<bool>,
    color: Option<Color>,
}

impl Capability for ColorControl {
    fn find_properties(&mut self, description: &ThingDescription) {
        let [on, color, temperature] =
            bind_slots(description, [ON_SLOT, COLOR_SLOT, COLOR_TEMPERATURE_SLOT]);
        self.on_property = on;
        self.color_property = color;
        self.temperature_property = temperature;
    }

    fn update_property(&mut self, name: &str, value: Option<&Value>) {
        let name = Some(name);

        if self.on_property.as_deref() == name {
            self.on = value.and_then(Value::as_bool);
        } else if self.color_property.as_deref() == name {
            self.color = value.and_then(Value::as_str).and_then(|hex| hex.parse().ok());
        } else if self.temperature_property.as_deref() == name {
            self.color = temperature_color(value);
        }
    }

    fn icon_view(&self) -> String {
        format!(
            r#"<webthing-color-control-capability data-state="{}"{}></webthing-color-control-capability>"#,
            on_state(self.on),
            color_attr(self.color),
        )
    }

    fn click(&self) -> Option<(&str, Value)> {
        toggle(self.on_property.as_ref(), self.on)
    }
}

/// A white light whose warmth can be set.
#[derive(Debug, Default)]
pub struct ColorTemperatureControl {
    on_property: Option<String>,
    temperature_property: Option<String>,
    on: Option<bool>,
    kelvin: Option<f64>,
}

impl Capability for ColorTemperatureControl {
    fn find_properties(&mut self, description: &ThingDescription) {
        let [on, temperature] = bind_slots(description, [ON_SLOT, COLOR_TEMPERATURE_SLOT]);
        self.on_property = on;
        self.temperature_property = temperature;
    }

    fn update_property(&mut self, name: &str, value: Option<&Value>) {
        let name = Some(name);

        if self.on_property.as_deref() == name {
            self.on = value.and_then(Value::as_bool);
        } else if self.temperature_property.as_deref() == name {
            self.kelvin = value.and_then(Value::as_f64);
        }
    }

    fn icon_view(&self) -> String {
        let kelvin = self
            .kelvin
            .map(|kelvin| format!(r#" data-temperature="{}""#, kelvin.round()))
            .unwrap_or_default();

        format!(
            r#"<webthing-color-temperature-control-capability data-state="{}"{kelvin}{}></webthing-color-temperature-control-capability>"#,
            on_state(self.on),
            color_attr(self.kelvin.map(color_temperature_to_rgb)),
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
    fn color_follows_last_change() {
        let mut thing = thing(
            json!({
                "id": "bulb",
                "@type": ["Light", "OnOffSwitch", "ColorControl"],
                "properties": {
                    "on": { "type": "boolean", "href": "/p/on" },
                    "color": { "type": "string", "@type": "ColorProperty", "href": "/p/color" },
                    "temp": { "type": "integer", "@type": "ColorTemperatureProperty", "href": "/p/temp" },
                },
            }),
            json!({ "on": true, "color": "#FF0000" }),
        );

        assert!(matches!(thing.variant(), ThingVariant::ColorControl(_)));
        assert!(thing.icon_view().contains(r##"data-color="#ff0000""##));

        thing.apply_push("temp", json!(6600));
        assert!(thing.icon_view().contains(r##"data-color="#ffffff""##));

        let write = thing.set_input("color", "#00ff00").unwrap();
        assert!(!thing.icon_view().contains("data-color"));
        thing.complete_write(&write, Ok(json!("#00ff00")));
        assert!(thing.icon_view().contains(r##"data-color="#00ff00""##));
    }

    #[test]
    fn temperature_only() {
        let mut thing = thing(
            json!({
                "id": "bulb",
                "@type": ["ColorControl"],
                "properties": {
                    "on": { "type": "boolean", "href": "/p/on" },
                    "colorTemperature": { "type": "integer", "minimum": 2000, "maximum": 6600, "href": "/p/ct" },
                },
            }),
            json!({ "on": false, "colorTemperature": 2000 }),
        );

        let ThingVariant::ColorTemperatureControl(control) = thing.variant() else {
            panic!("expected a color temperature control");
        };
        assert_eq!(control.temperature_property.as_deref(), Some("colorTemperature"));

        let icon = thing.icon_view();
        assert!(icon.contains(r#"data-state="off""#));
        assert!(icon.contains(r#"data-temperature="2000""#));
        assert!(icon.contains(r##"data-color="#ff890e""##));

        assert!(thing.set_input("colorTemperature", "9000").is_none());
        assert!(thing.icon_view().contains(r#"data-temperature="2000""#));
    }
}
