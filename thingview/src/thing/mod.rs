//! A thing as shown to the user: its properties' state, their renderers, and
//! the capability-specific icon.
//!
//! Every change to a property's state goes through [`Thing::update_property`].

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;
use thingview_common::{
    PropertyDescriptor, ThingDescription, ThingId,
    capabilities::{Capability as CapabilityKind, semantic},
    utils::{escape_html, escape_html_for_id_class},
};

use crate::{
    Error, Result, Transport,
    detail::{MediaFetch, PropertyDetail},
    form::{ActionInputForm, ActionRequest},
    sync::{Generation, PropertyState, Reconciliation},
};

mod color;
mod generic;
mod level;
mod on_off;

pub use self::{
    color::{ColorControl, ColorTemperatureControl},
    generic::Generic,
    level::MultiLevelSwitch,
    on_off::OnOffSwitch,
};

/// What each kind of thing does with the properties it recognizes.
pub trait Capability {
    /// Binds the properties this capability knows how to show.
    fn find_properties(&mut self, description: &ThingDescription);

    /// Follows a property's displayed value. `None` is the transition state.
    fn update_property(&mut self, name: &str, value: Option<&Value>);

    fn icon_view(&self) -> String;

    /// The write a click on the icon makes, if any.
    fn click(&self) -> Option<(&str, Value)> {
        None
    }
}

#[derive(Debug)]
pub enum ThingVariant {
    OnOffSwitch(OnOffSwitch),
    MultiLevelSwitch(MultiLevelSwitch),
    ColorControl(ColorControl),
    ColorTemperatureControl(ColorTemperatureControl),
    Generic(Generic),
}

impl ThingVariant {
    pub fn detect(description: &ThingDescription) -> Self {
        let mut variant = match CapabilityKind::detect(description) {
            CapabilityKind::OnOffSwitch => Self::OnOffSwitch(OnOffSwitch::default()),
            CapabilityKind::MultiLevelSwitch => Self::MultiLevelSwitch(MultiLevelSwitch::default()),
            CapabilityKind::ColorControl => Self::ColorControl(ColorControl::default()),
            CapabilityKind::ColorTemperatureControl => {
                Self::ColorTemperatureControl(ColorTemperatureControl::default())
            }
            CapabilityKind::Generic => Self::Generic(Generic),
        };

        variant.find_properties(description);
        variant
    }

    fn inner(&self) -> &dyn Capability {
        match self {
            Self::OnOffSwitch(cap) => cap,
            Self::MultiLevelSwitch(cap) => cap,
            Self::ColorControl(cap) => cap,
            Self::ColorTemperatureControl(cap) => cap,
            Self::Generic(cap) => cap,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Capability {
        match self {
            Self::OnOffSwitch(cap) => cap,
            Self::MultiLevelSwitch(cap) => cap,
            Self::ColorControl(cap) => cap,
            Self::ColorTemperatureControl(cap) => cap,
            Self::Generic(cap) => cap,
        }
    }
}

impl Capability for ThingVariant {
    fn find_properties(&mut self, description: &ThingDescription) {
        self.inner_mut().find_properties(description);
    }

    fn update_property(&mut self, name: &str, value: Option<&Value>) {
        self.inner_mut().update_property(name, value);
    }

    fn icon_view(&self) -> String {
        self.inner().icon_view()
    }

    fn click(&self) -> Option<(&str, Value)> {
        self.inner().click()
    }
}

/// A role a capability looks for among the properties.
#[derive(Debug, Clone, Copy)]
pub struct SlotSpec {
    pub semantics: &'static [&'static str],
    /// Property name used when nothing carries the annotation.
    pub fallback: &'static str,
}

impl SlotSpec {
    fn matches(&self, name: &str, property: &PropertyDescriptor) -> bool {
        property
            .semantics
            .iter()
            .any(|annotation| self.semantics.contains(&annotation.as_str()))
            || name == self.fallback
    }
}

pub const ON_SLOT: SlotSpec = SlotSpec { semantics: &[semantic::ON_OFF], fallback: "on" };
pub const LEVEL_SLOT: SlotSpec = SlotSpec {
    semantics: &[semantic::LEVEL, semantic::BRIGHTNESS],
    fallback: "level",
};
pub const COLOR_SLOT: SlotSpec = SlotSpec { semantics: &[semantic::COLOR], fallback: "color" };
pub const COLOR_TEMPERATURE_SLOT: SlotSpec = SlotSpec {
    semantics: &[semantic::COLOR_TEMPERATURE],
    fallback: "colorTemperature",
};

/// Fills slots in property order. A property takes the first empty slot it
/// matches and no other.
pub fn bind_slots<const N: usize>(
    description: &ThingDescription,
    specs: [SlotSpec; N],
) -> [Option<String>; N] {
    let mut slots = core::array::from_fn::<Option<String>, N, _>(|_| None);

    for (name, property) in &description.properties {
        let free = specs
            .iter()
            .zip(slots.iter_mut())
            .find(|(spec, slot)| slot.is_none() && spec.matches(name, property));

        if let Some((_, slot)) = free {
            *slot = Some(name.clone());
        }
    }

    slots
}

fn on_state(on: Option<bool>) -> &'static str {
    match on {
        Some(true) => "on",
        Some(false) => "off",
        None => "transition",
    }
}

/// Flips an on/off slot. Nothing to flip while the state is unknown.
fn toggle(property: Option<&String>, on: Option<bool>) -> Option<(&str, Value)> {
    Some((property?.as_str(), Value::Bool(!on?)))
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyUpdate {
    /// A local write is about to go out.
    Write,
    Response { generation: Generation, value: Value },
    Failure { generation: Generation },
    Push(Value),
}

/// A property write that has been applied optimistically and still has to
/// be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub property: String,
    pub href: String,
    pub value: Value,
    pub generation: Generation,
}

#[derive(Debug)]
struct Binding {
    state: PropertyState,
    detail: PropertyDetail,
}

#[derive(Debug)]
pub struct Thing {
    description: ThingDescription,
    variant: ThingVariant,
    bindings: IndexMap<String, Binding>,
    forms: IndexMap<String, ActionInputForm>,
}

impl Thing {
    /// Fetches a description and the current value of its properties.
    pub async fn load(transport: &impl Transport, href: &str) -> Result<Self> {
        let mut description = transport.get_description(href).await?;
        description.href.get_or_insert_with(|| href.to_owned());

        let properties_href = description
            .properties_href()
            .ok_or(Error::MissingEndpoint("properties"))?;
        let snapshot = transport.get_properties(&properties_href).await?;

        tracing::info!(thing = %description.id, properties = snapshot.len(), "loaded thing");

        Ok(Self::new(description, &snapshot))
    }

    pub fn new(description: ThingDescription, snapshot: &IndexMap<String, Value>) -> Self {
        let mut variant = ThingVariant::detect(&description);
        let mut bindings = IndexMap::new();

        for (name, property) in &description.properties {
            let initial = snapshot.get(name).filter(|value| {
                let ok = property.kind.accepts(value);
                if !ok {
                    tracing::warn!(thing = %description.id, property = %name, "ignoring {value} for a {} property", property.kind);
                }
                ok
            });

            let mut detail = PropertyDetail::new(name, property);
            if let Some(value) = initial {
                detail.update(Some(value));
                variant.update_property(name, Some(value));
            }

            bindings.insert(name.clone(), Binding {
                state: PropertyState::new(initial.cloned()),
                detail,
            });
        }

        let forms = description
            .actions
            .iter()
            .map(|(name, action)| (name.clone(), ActionInputForm::new(name, action)))
            .collect();

        Self { description, variant, bindings, forms }
    }

    pub fn id(&self) -> &ThingId {
        &self.description.id
    }

    pub fn href(&self) -> Option<&str> {
        self.description.href.as_deref()
    }

    pub fn description(&self) -> &ThingDescription {
        &self.description
    }

    pub fn variant(&self) -> &ThingVariant {
        &self.variant
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)?.state.value()
    }

    pub fn state(&self, name: &str) -> Option<&PropertyState> {
        Some(&self.bindings.get(name)?.state)
    }

    pub fn detail(&self, name: &str) -> Option<&PropertyDetail> {
        Some(&self.bindings.get(name)?.detail)
    }

    pub fn detail_mut(&mut self, name: &str) -> Option<&mut PropertyDetail> {
        Some(&mut self.bindings.get_mut(name)?.detail)
    }

    pub fn form_mut(&mut self, action: &str) -> Option<&mut ActionInputForm> {
        self.forms.get_mut(action)
    }

    /// Applies a change to one property and refreshes what shows it.
    ///
    /// Returns `None` if the thing doesn't show a property by that name.
    pub fn update_property(&mut self, name: &str, update: PropertyUpdate) -> Option<Reconciliation> {
        let binding = self.bindings.get_mut(name)?;
        let kind = self.description.properties.get(name)?.kind;
        let state = &mut binding.state;

        let outcome = match update {
            PropertyUpdate::Write => {
                state.begin_write();
                Reconciliation::Pending
            }
            PropertyUpdate::Response { generation, value } if kind.accepts(&value) => {
                state.apply_response(generation, value)
            }
            PropertyUpdate::Response { generation, value } => {
                tracing::warn!(thing = %self.description.id, property = %name, "gateway accepted {value} for a {kind} property");
                state.fail(generation)
            }
            PropertyUpdate::Failure { generation } => state.fail(generation),
            PropertyUpdate::Push(value) if kind.accepts(&value) => state.apply_push(value),
            PropertyUpdate::Push(value) => {
                tracing::warn!(thing = %self.description.id, property = %name, "ignoring pushed {value} for a {kind} property");
                return Some(Reconciliation::Discarded);
            }
        };

        if matches!(outcome, Reconciliation::Discarded | Reconciliation::Ignored) {
            tracing::debug!(thing = %self.description.id, property = %name, ?outcome, "superseded");
            return Some(outcome);
        }

        binding.detail.update(state.value());
        self.variant.update_property(name, state.value());

        Some(outcome)
    }

    /// Shows the transition state for `name` and returns the write to send.
    ///
    /// Refused, with a warning, for read-only properties, properties without
    /// a write endpoint, and values the property can't hold.
    pub fn begin_write(&mut self, name: &str, value: Value) -> Option<PendingWrite> {
        let property = self.description.properties.get(name)?;

        if property.read_only {
            tracing::warn!(thing = %self.description.id, property = %name, "property is read-only");
            return None;
        }

        let Some(href) = property.write_href() else {
            tracing::warn!(thing = %self.description.id, property = %name, "property has no write endpoint");
            return None;
        };

        if !property.kind.accepts(&value) || !property.in_bounds(&value) {
            tracing::warn!(thing = %self.description.id, property = %name, "refusing to write {value}");
            return None;
        }

        let href = href.to_owned();
        self.update_property(name, PropertyUpdate::Write)?;

        Some(PendingWrite {
            property: name.to_owned(),
            href,
            value,
            generation: self.bindings[name].state.generation(),
        })
    }

    /// Types `raw` into the property's input and commits it.
    pub fn set_input(&mut self, name: &str, raw: &str) -> Option<PendingWrite> {
        self.detail_mut(name)?.as_input_mut()?.set_value(raw);
        self.commit_input(name)
    }

    /// Commits whatever is in the property's input. A rejected entry is
    /// replaced by the value on display.
    pub fn commit_input(&mut self, name: &str) -> Option<PendingWrite> {
        let binding = self.bindings.get_mut(name)?;
        let input = binding.detail.as_input_mut()?;

        match input.commit() {
            Ok(value) => self.begin_write(name, value),
            Err(e) => {
                tracing::warn!(thing = %self.description.id, property = %name, "{e}");
                input.update(binding.state.value());
                None
            }
        }
    }

    /// Flips a boolean property whose value is known.
    pub fn toggle(&mut self, name: &str) -> Option<PendingWrite> {
        let on = self.value(name)?.as_bool()?;
        self.begin_write(name, Value::Bool(!on))
    }

    /// What clicking the thing's icon does.
    pub fn click(&mut self) -> Option<PendingWrite> {
        let (name, value) = self.variant.click()?;
        let name = name.to_owned();
        self.begin_write(&name, value)
    }

    /// Reconciles the outcome of a write made with [`Thing::begin_write`].
    pub fn complete_write(
        &mut self,
        write: &PendingWrite,
        result: Result<Value>,
    ) -> Option<Reconciliation> {
        let update = match result {
            Ok(value) => PropertyUpdate::Response { generation: write.generation, value },
            Err(e) => {
                tracing::error!(thing = %self.description.id, property = %write.property, "write failed: {e}");
                PropertyUpdate::Failure { generation: write.generation }
            }
        };

        self.update_property(&write.property, update)
    }

    pub fn apply_push(&mut self, name: &str, value: Value) -> Option<Reconciliation> {
        self.update_property(name, PropertyUpdate::Push(value))
    }

    /// Submits an action's form.
    pub fn invoke(&self, action: &str) -> Result<ActionRequest> {
        let form = self
            .forms
            .get(action)
            .ok_or_else(|| Error::UnknownAction(action.to_owned()))?;
        let href = self
            .description
            .action_href(action)
            .ok_or(Error::MissingEndpoint("action"))?;

        Ok(form.submit(&href)?)
    }

    /// Image fetches queued by opened or refreshed modals.
    pub fn take_media_fetches(&mut self) -> Vec<MediaFetch> {
        self.bindings
            .values_mut()
            .filter_map(|binding| binding.detail.as_image_mut()?.take_fetch())
            .collect()
    }

    pub fn media_loaded(&mut self, fetch: &MediaFetch, image: Bytes) -> bool {
        self.detail_mut(&fetch.property)
            .and_then(PropertyDetail::as_image_mut)
            .is_some_and(|detail| detail.loaded(fetch.load, image))
    }

    pub fn attach(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.detail.attach();
        }

        for form in self.forms.values_mut() {
            form.attach();
        }
    }

    pub fn icon_view(&self) -> String {
        self.variant.icon_view()
    }

    /// The tile shown in the things list.
    pub fn card_view(&self) -> String {
        format!(
            r#"<div id="thing-{}" class="thing"><div class="thing-icon">{}</div><span class="thing-title">{}</span></div>"#,
            escape_html_for_id_class(self.description.id.as_str()),
            self.icon_view(),
            escape_html(self.description.display_name()),
        )
    }

    pub fn detail_view(&self) -> String {
        let mut html = format!(
            r#"<div id="thing-detail-{}" class="thing-detail-view">"#,
            escape_html_for_id_class(self.description.id.as_str()),
        );

        for binding in self.bindings.values() {
            html.push_str(&binding.detail.view());
        }

        for form in self.forms.values() {
            html.push_str(&form.view());
        }

        html.push_str("</div>");
        html
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{client::mock::MockTransport, detail::TRANSITION_TEXT};

    pub(super) fn thing(description: Value, snapshot: Value) -> Thing {
        let description = serde_json::from_value(description).unwrap();
        let snapshot = serde_json::from_value(snapshot).unwrap();
        Thing::new(description, &snapshot)
    }

    fn unknown_things() -> Thing {
        thing(
            json!({
                "id": "UnknownThings",
                "name": "foofoo",
                "type": "thing",
                "href": "/things/UnknownThings",
                "properties": {
                    "numberProp": { "type": "number", "unit": "percent", "href": "/things/UnknownThings/properties/numberProp" },
                    "stringProp": { "type": "string", "href": "/things/UnknownThings/properties/stringProp" },
                    "booleanProp": { "type": "boolean", "href": "/things/UnknownThings/properties/booleanProp" },
                    "readOnlyProp": { "type": "string", "readOnly": true },
                },
            }),
            json!({ "numberProp": 10, "stringProp": "bar", "booleanProp": true, "readOnlyProp": "ro" }),
        )
    }

    #[test]
    fn set_number_via_input() {
        let mut thing = unknown_things();
        assert!(matches!(thing.variant(), ThingVariant::Generic(_)));

        let write = thing.set_input("numberProp", "20").unwrap();
        assert_eq!(write.href, "/things/UnknownThings/properties/numberProp");
        assert_eq!(write.value, json!(20));
        assert_eq!(thing.value("numberProp"), None);

        assert_eq!(thing.complete_write(&write, Ok(json!(20))), Some(Reconciliation::Applied));
        assert_eq!(thing.value("numberProp"), Some(&json!(20)));

        let input = thing.detail("numberProp").unwrap().as_input().unwrap();
        assert_eq!(input.get_value(), "20");
        assert!(!input.is_pending());
    }

    #[test]
    fn rejected_input_keeps_state() {
        let mut thing = thing(
            json!({
                "id": "dimmer",
                "properties": {
                    "level": { "type": "integer", "minimum": 0, "maximum": 100, "href": "/p/level" },
                },
            }),
            json!({ "level": 30 }),
        );

        assert_eq!(thing.set_input("level", "120"), None);
        assert_eq!(thing.set_input("level", "abc"), None);

        assert_eq!(thing.value("level"), Some(&json!(30)));
        assert_eq!(thing.state("level").unwrap().generation(), 0);
        assert_eq!(
            thing.detail("level").unwrap().as_input().unwrap().get_value(),
            "30"
        );
    }

    #[test]
    fn push_overrides_pending_write() {
        let mut thing = unknown_things();

        let write = thing.set_input("stringProp", "baz").unwrap();
        assert_eq!(thing.apply_push("stringProp", json!("pushed")), Some(Reconciliation::Applied));

        assert_eq!(thing.complete_write(&write, Ok(json!("baz"))), Some(Reconciliation::Discarded));
        assert_eq!(thing.value("stringProp"), Some(&json!("pushed")));
    }

    #[test]
    fn failed_write_rolls_back() {
        let mut thing = unknown_things();

        let write = thing.toggle("booleanProp").unwrap();
        assert_eq!(write.value, json!(false));

        let err = Error::Status { status: 500, url: write.href.clone() };
        assert_eq!(thing.complete_write(&write, Err(err)), Some(Reconciliation::RolledBack));
        assert_eq!(thing.value("booleanProp"), Some(&json!(true)));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let mut thing = unknown_things();

        assert_eq!(thing.apply_push("numberProp", json!("ten")), Some(Reconciliation::Discarded));
        assert_eq!(thing.value("numberProp"), Some(&json!(10)));

        let write = thing.set_input("numberProp", "11").unwrap();
        assert_eq!(
            thing.complete_write(&write, Ok(json!("eleven"))),
            Some(Reconciliation::RolledBack)
        );
        assert_eq!(thing.value("numberProp"), Some(&json!(10)));

        assert_eq!(thing.begin_write("booleanProp", json!(1)), None);
    }

    #[test]
    fn unknown_property_is_a_no_op() {
        let mut thing = unknown_things();

        assert_eq!(thing.apply_push("nope", json!(1)), None);
        assert_eq!(thing.begin_write("nope", json!(1)), None);
    }

    #[test]
    fn read_only_and_missing_endpoint() {
        let mut thing = thing(
            json!({
                "id": "t",
                "properties": {
                    "ro": { "type": "string", "readOnly": true, "href": "/p/ro" },
                    "nowhere": { "type": "string" },
                },
            }),
            json!({ "ro": "a", "nowhere": "b" }),
        );

        assert_eq!(thing.begin_write("ro", json!("x")), None);
        assert_eq!(thing.begin_write("nowhere", json!("x")), None);
        assert_eq!(thing.value("nowhere"), Some(&json!("b")));
    }

    #[test]
    fn labels_show_transition() {
        let mut thing = unknown_things();

        let label = |thing: &Thing| match thing.detail("readOnlyProp").unwrap() {
            PropertyDetail::Label(label) => label.text().to_owned(),
            other => panic!("expected a label, got {other:?}"),
        };

        assert_eq!(label(&thing), "ro");
        thing.apply_push("readOnlyProp", json!("new"));
        assert_eq!(label(&thing), "new");

        let detail = thing.detail_mut("readOnlyProp").unwrap();
        detail.update(None);
        assert_eq!(label(&thing), TRANSITION_TEXT);
    }

    #[test]
    fn invoke_action() {
        let mut thing = thing(
            json!({
                "id": "fan",
                "href": "/things/fan",
                "actions": {
                    "spin": {
                        "input": {
                            "type": "object",
                            "properties": { "speed": { "type": "integer" } },
                        },
                    },
                },
            }),
            json!({}),
        );

        thing.form_mut("spin").unwrap().set_field("speed", "3").unwrap();
        let request = thing.invoke("spin").unwrap();

        assert_eq!(request.href, "/things/fan/actions/spin");
        assert_eq!(request.body, json!({ "spin": { "input": { "speed": 3 } } }));
        assert!(matches!(thing.invoke("stop"), Err(Error::UnknownAction(_))));
    }

    #[test]
    fn views() {
        let mut thing = unknown_things();
        thing.attach();
        thing.attach();

        let card = thing.card_view();
        assert!(card.contains(r#"id="thing-UnknownThings""#));
        assert!(card.contains("foofoo"));

        let detail = thing.detail_view();
        assert!(detail.contains(r#"id="number-numberProp""#));
        assert!(detail.contains(r#"id="string-stringProp""#));
        assert!(detail.contains(r#"id="checkbox-booleanProp""#));
        assert!(detail.contains(r#"id="label-readOnlyProp""#));
        assert_eq!(detail, thing.detail_view());
    }

    #[test]
    fn initial_values_of_wrong_type_are_unknown() {
        let thing = thing(
            json!({ "id": "t", "properties": { "n": { "type": "number" } } }),
            json!({ "n": "oops" }),
        );

        assert_eq!(thing.value("n"), None);
        assert!(!thing.state("n").unwrap().is_pending());
    }

    #[tokio::test]
    async fn load_from_gateway() {
        let transport = MockTransport::with_thing(
            "/things/lamp",
            json!({
                "id": "lamp",
                "@type": ["OnOffSwitch"],
                "properties": { "on": { "type": "boolean", "href": "/things/lamp/properties/on" } },
            }),
            json!({ "on": true }),
        );

        let thing = Thing::load(&transport, "/things/lamp").await.unwrap();
        assert_eq!(thing.href(), Some("/things/lamp"));
        assert_eq!(thing.value("on"), Some(&json!(true)));
        assert!(matches!(thing.variant(), ThingVariant::OnOffSwitch(_)));

        assert!(Thing::load(&transport, "/things/missing").await.is_err());
    }
}
