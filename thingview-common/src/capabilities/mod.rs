pub mod light;

use crate::ThingDescription;

/// Capability names found in a thing's `@type` list.
pub mod ids {
    pub const COLOR_CONTROL: &str = "ColorControl";
    pub const LIGHT: &str = "Light";
    pub const MULTI_LEVEL_SWITCH: &str = "MultiLevelSwitch";
    pub const ON_OFF_SWITCH: &str = "OnOffSwitch";
}

/// Property annotations found in a property's `@type`.
pub mod semantic {
    pub const BRIGHTNESS: &str = "BrightnessProperty";
    pub const COLOR: &str = "ColorProperty";
    pub const COLOR_TEMPERATURE: &str = "ColorTemperatureProperty";
    pub const IMAGE: &str = "ImageProperty";
    pub const LEVEL: &str = "LevelProperty";
    pub const ON_OFF: &str = "OnOffProperty";
    pub const VIDEO: &str = "VideoProperty";
}

/// Which view a thing is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    OnOffSwitch,
    MultiLevelSwitch,
    ColorControl,
    ColorTemperatureControl,
    Generic,
}

impl Capability {
    /// Picks the capability for a description.
    ///
    /// `selectedCapability` wins, then the richest recognized `@type` entry,
    /// then the legacy `type` tag.
    pub fn detect(description: &ThingDescription) -> Self {
        let detected = description
            .selected_capability
            .as_deref()
            .and_then(Self::from_capability_name)
            .or_else(|| {
                description
                    .capabilities
                    .iter()
                    .filter_map(|name| Self::from_capability_name(name))
                    .max_by_key(|cap| cap.priority())
            })
            .or_else(|| description.type_tag.as_deref().and_then(Self::from_legacy_type))
            .unwrap_or(Self::Generic);

        if detected == Self::ColorControl
            && !description.has_property(semantic::COLOR, "color")
            && description.has_property(semantic::COLOR_TEMPERATURE, "colorTemperature")
        {
            return Self::ColorTemperatureControl;
        }

        detected
    }

    pub fn from_capability_name(name: &str) -> Option<Self> {
        match name {
            ids::COLOR_CONTROL => Some(Self::ColorControl),
            ids::MULTI_LEVEL_SWITCH => Some(Self::MultiLevelSwitch),
            ids::ON_OFF_SWITCH | ids::LIGHT => Some(Self::OnOffSwitch),
            _ => None,
        }
    }

    pub fn from_legacy_type(tag: &str) -> Option<Self> {
        match tag {
            "onOffSwitch" | "onOffLight" => Some(Self::OnOffSwitch),
            "multiLevelSwitch" | "dimmableLight" => Some(Self::MultiLevelSwitch),
            "onOffColorLight" | "dimmableColorLight" => Some(Self::ColorControl),
            _ => None,
        }
    }

    const fn priority(self) -> u8 {
        match self {
            Self::Generic => 0,
            Self::OnOffSwitch => 1,
            Self::MultiLevelSwitch => 2,
            Self::ColorTemperatureControl => 3,
            Self::ColorControl => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(value: serde_json::Value) -> ThingDescription {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn selected_capability_wins() {
        let desc = describe(serde_json::json!({
            "id": "lamp",
            "@type": ["OnOffSwitch", "ColorControl"],
            "selectedCapability": "OnOffSwitch",
            "properties": { "on": { "type": "boolean" } },
        }));

        assert_eq!(Capability::detect(&desc), Capability::OnOffSwitch);
    }

    #[test]
    fn richest_capability_wins() {
        let desc = describe(serde_json::json!({
            "id": "lamp",
            "@type": ["Light", "OnOffSwitch", "MultiLevelSwitch"],
        }));

        assert_eq!(Capability::detect(&desc), Capability::MultiLevelSwitch);
    }

    #[test]
    fn legacy_types() {
        let desc = describe(serde_json::json!({
            "id": "lamp",
            "type": "dimmableColorLight",
            "properties": { "color": { "type": "string" } },
        }));
        assert_eq!(Capability::detect(&desc), Capability::ColorControl);

        let desc = describe(serde_json::json!({ "id": "thing", "type": "thing" }));
        assert_eq!(Capability::detect(&desc), Capability::Generic);
    }

    #[test]
    fn color_temperature_only() {
        let desc = describe(serde_json::json!({
            "id": "bulb",
            "@type": ["ColorControl"],
            "properties": {
                "temp": { "type": "integer", "@type": "ColorTemperatureProperty" },
            },
        }));

        assert_eq!(Capability::detect(&desc), Capability::ColorTemperatureControl);
    }
}
