use serde_json::Value;
use thingview_common::ThingDescription;

use super::Capability;

/// A thing with no recognized capability. Its properties are only shown on
/// the detail page.
#[derive(Debug, Default)]
pub struct Generic;

impl Capability for Generic {
    fn find_properties(&mut self, _description: &ThingDescription) {}

    fn update_property(&mut self, _name: &str, _value: Option<&Value>) {}

    fn icon_view(&self) -> String {
        r#"<img class="thing-icon" src="/images/thing-icons/thing.svg" alt="">"#.to_owned()
    }
}
