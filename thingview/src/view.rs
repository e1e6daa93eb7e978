//! The things on screen and the single task that keeps them current.
//!
//! UI events, pushed updates and finished requests are handled one at a
//! time. Requests never hold on to a thing; what comes back re-enters
//! through [`Thing::update_property`] and the generation check decides
//! whether it still matters.

use std::rc::Rc;

use bytes::Bytes;
use futures::{FutureExt as _, StreamExt as _, future::LocalBoxFuture, stream::FuturesUnordered};
use indexmap::IndexMap;
use reqwest::header::HeaderMap;
use serde_json::Value;
use thingview_common::ThingId;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    Result, Thing, Transport,
    detail::{MediaFetch, PropertyDetail, RequestFilter, StreamingPlayer},
    dom::EventTarget,
    form::ActionRequest,
    push::PushEvent,
    thing::PendingWrite,
};

/// Something the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Click on a thing's icon.
    Click { thing: ThingId },
    /// Text committed into a property's input.
    Input { thing: ThingId, property: String, raw: String },
    Toggle { thing: ThingId, property: String },
    SetField { thing: ThingId, action: String, field: String, raw: String },
    Invoke { thing: ThingId, action: String },
    OpenMedia { thing: ThingId, property: String },
    CloseMedia { thing: ThingId, property: String },
    /// The refresh button in an image modal.
    RefreshMedia { thing: ThingId, property: String },
    /// The video modal's frame or video changed size.
    Resize { thing: ThingId, property: String, parent_width: f64, video_width: f64 },
    Remove { thing: ThingId },
}

enum Completion {
    Write { thing: ThingId, write: PendingWrite, result: Result<Value> },
    Action { request: ActionRequest, result: Result<()> },
    Media { thing: ThingId, fetch: MediaFetch, result: Result<Bytes> },
}

type PlayerFactory = Box<dyn Fn() -> Box<dyn StreamingPlayer>>;

pub struct ThingsView<T> {
    transport: Rc<T>,
    things: IndexMap<ThingId, Thing>,
    window: EventTarget,
    players: Option<PlayerFactory>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
}

impl<T: Transport + 'static> ThingsView<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Rc::new(transport),
            things: IndexMap::new(),
            window: EventTarget::default(),
            players: None,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Where video modals get their players from.
    pub fn with_players(mut self, players: impl Fn() -> Box<dyn StreamingPlayer> + 'static) -> Self {
        self.players = Some(Box::new(players));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn window(&self) -> &EventTarget {
        &self.window
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn thing(&self, id: &ThingId) -> Option<&Thing> {
        self.things.get(id)
    }

    pub fn thing_mut(&mut self, id: &ThingId) -> Option<&mut Thing> {
        self.things.get_mut(id)
    }

    pub fn things(&self) -> impl Iterator<Item = &Thing> {
        self.things.values()
    }

    pub async fn load(&mut self, href: &str) -> Result<&Thing> {
        let thing = Thing::load(&*self.transport, href).await?;
        let id = thing.id().clone();
        self.insert(thing);
        Ok(&self.things[&id])
    }

    /// Adds a thing, or replaces the one with the same id.
    pub fn insert(&mut self, mut thing: Thing) {
        thing.attach();
        if let Some(mut old) = self.things.insert(thing.id().clone(), thing) {
            tracing::debug!(thing = %old.id(), "replaced thing");
            self.close_media(&mut old);
        }
    }

    pub fn remove(&mut self, id: &ThingId) -> Option<Thing> {
        let mut thing = self.things.shift_remove(id)?;
        self.close_media(&mut thing);
        Some(thing)
    }

    /// Closes every open modal of a thing leaving the view.
    fn close_media(&mut self, thing: &mut Thing) {
        let names = thing
            .description()
            .properties
            .keys()
            .cloned()
            .collect::<Vec<_>>();

        for name in names {
            match thing.detail_mut(&name) {
                Some(PropertyDetail::Video(video)) => video.close(&mut self.window),
                Some(PropertyDetail::Image(image)) => image.close(),
                _ => {}
            }
        }
    }

    /// The things list.
    pub fn view(&self) -> String {
        let mut html = r#"<div id="things">"#.to_owned();
        for thing in self.things.values() {
            html.push_str(&thing.card_view());
        }
        html.push_str("</div>");
        html
    }

    pub fn handle_ui(&mut self, event: UiEvent) {
        tracing::debug!(?event, "ui event");

        match event {
            UiEvent::Click { thing } => {
                if let Some(write) = self.things.get_mut(&thing).and_then(Thing::click) {
                    self.send_write(thing, write);
                }
            }
            UiEvent::Input { thing, property, raw } => {
                let write = self
                    .things
                    .get_mut(&thing)
                    .and_then(|t| t.set_input(&property, &raw));
                if let Some(write) = write {
                    self.send_write(thing, write);
                }
            }
            UiEvent::Toggle { thing, property } => {
                let write = self.things.get_mut(&thing).and_then(|t| t.toggle(&property));
                if let Some(write) = write {
                    self.send_write(thing, write);
                }
            }
            UiEvent::SetField { thing, action, field, raw } => {
                let Some(form) = self.things.get_mut(&thing).and_then(|t| t.form_mut(&action)) else {
                    tracing::warn!(%thing, action, "no such action");
                    return;
                };
                if let Err(e) = form.set_field(&field, &raw) {
                    tracing::warn!(%thing, action, "{e}");
                }
            }
            UiEvent::Invoke { thing, action } => {
                let Some(t) = self.things.get(&thing) else {
                    return;
                };
                match t.invoke(&action) {
                    Ok(request) => self.send_action(request),
                    Err(e) => tracing::warn!(%thing, action, "not invoking: {e}"),
                }
            }
            UiEvent::OpenMedia { thing, property } => self.open_media(thing, &property),
            UiEvent::CloseMedia { thing, property } => {
                match self.things.get_mut(&thing).and_then(|t| t.detail_mut(&property)) {
                    Some(PropertyDetail::Image(image)) => image.close(),
                    Some(PropertyDetail::Video(video)) => video.close(&mut self.window),
                    _ => {}
                }
            }
            UiEvent::RefreshMedia { thing, property } => {
                let image = self
                    .things
                    .get_mut(&thing)
                    .and_then(|t| t.detail_mut(&property))
                    .and_then(PropertyDetail::as_image_mut);
                if let Some(image) = image {
                    image.refresh();
                    self.send_media(&thing);
                }
            }
            UiEvent::Resize { thing, property, parent_width, video_width } => {
                let video = self
                    .things
                    .get_mut(&thing)
                    .and_then(|t| t.detail_mut(&property))
                    .and_then(PropertyDetail::as_video_mut);
                if let Some(video) = video {
                    video.position_buttons(parent_width, video_width);
                }
            }
            UiEvent::Remove { thing } => {
                self.remove(&thing);
            }
        }
    }

    pub fn handle_push(&mut self, event: PushEvent) {
        let Some(thing) = self.things.get_mut(&event.thing) else {
            tracing::debug!(thing = %event.thing, "push for a thing not on screen");
            return;
        };

        thing.apply_push(&event.property, event.value);
        self.send_media(&event.thing);
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Write { thing, write, result } => match self.things.get_mut(&thing) {
                Some(t) => {
                    t.complete_write(&write, result);
                    self.send_media(&thing);
                }
                None => tracing::debug!(%thing, "write finished for a removed thing"),
            },
            Completion::Action { request, result } => match result {
                Ok(()) => tracing::debug!(action = request.action, "action invoked"),
                Err(e) => tracing::error!(action = request.action, "action failed: {e}"),
            },
            Completion::Media { thing, fetch, result } => {
                let image = match result {
                    Ok(image) => image,
                    Err(e) => {
                        tracing::warn!(%thing, property = fetch.property, "media fetch failed: {e}");
                        return;
                    }
                };

                if let Some(t) = self.things.get_mut(&thing) {
                    t.media_loaded(&fetch, image);
                }
            }
        }
    }

    fn open_media(&mut self, thing: ThingId, property: &str) {
        let Some(detail) = self.things.get_mut(&thing).and_then(|t| t.detail_mut(property)) else {
            return;
        };

        match detail {
            PropertyDetail::Image(image) => {
                image.open();
                self.send_media(&thing);
            }
            PropertyDetail::Video(video) => {
                let Some(players) = &self.players else {
                    tracing::warn!(%thing, property, "no video player available");
                    return;
                };

                let transport = self.transport.clone();
                let filter: RequestFilter =
                    Box::new(move |headers: &mut HeaderMap| transport.authorize(headers));
                video.open(&mut self.window, players(), filter);
            }
            _ => tracing::warn!(%thing, property, "not a media property"),
        }
    }

    fn send_write(&mut self, thing: ThingId, write: PendingWrite) {
        let transport = self.transport.clone();

        self.in_flight.push(
            async move {
                let result = transport
                    .put_property(&write.href, &write.property, write.value.clone())
                    .await;
                Completion::Write { thing, write, result }
            }
            .boxed_local(),
        );
    }

    fn send_action(&mut self, request: ActionRequest) {
        let transport = self.transport.clone();

        self.in_flight.push(
            async move {
                let result = transport.post_action(&request.href, request.body.clone()).await;
                Completion::Action { request, result }
            }
            .boxed_local(),
        );
    }

    fn send_media(&mut self, id: &ThingId) {
        let Some(thing) = self.things.get_mut(id) else {
            return;
        };

        for fetch in thing.take_media_fetches() {
            let transport = self.transport.clone();
            let thing = id.clone();

            self.in_flight.push(
                async move {
                    let result = transport.fetch_media(&fetch.href).await;
                    Completion::Media { thing, fetch, result }
                }
                .boxed_local(),
            );
        }
    }

    /// Waits for everything in flight to finish.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.in_flight.next().await {
            self.handle_completion(completion);
        }
    }

    /// Runs until both channels are closed and nothing is in flight.
    /// `on_render` is called after every change.
    pub async fn run(
        &mut self,
        mut ui: UnboundedReceiver<UiEvent>,
        mut push: UnboundedReceiver<PushEvent>,
        mut on_render: impl FnMut(&Self),
    ) {
        let mut ui_open = true;
        let mut push_open = true;

        on_render(self);

        loop {
            if !ui_open && !push_open && self.in_flight.is_empty() {
                break;
            }

            tokio::select! {
                event = ui.recv(), if ui_open => match event {
                    Some(event) => self.handle_ui(event),
                    None => {
                        ui_open = false;
                        continue;
                    }
                },
                event = push.recv(), if push_open => match event {
                    Some(event) => self.handle_push(event),
                    None => {
                        push_open = false;
                        continue;
                    }
                },
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.handle_completion(completion);
                }
                else => break,
            }

            on_render(self);
        }

        tracing::debug!("view loop finished");
    }
}
