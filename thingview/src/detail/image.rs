use bytes::Bytes;
use serde_json::Value;
use thingview_common::{DomId, PropertyDescriptor, utils::escape_html};

use crate::dom::{EventKind, EventTarget};

/// A fetch the image modal wants made. `load` identifies it so late
/// arrivals can be told apart from the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFetch {
    pub property: String,
    pub href: String,
    pub load: u64,
}

#[derive(Debug)]
struct ImageModal {
    load: u64,
    image: Option<Bytes>,
    listeners: EventTarget,
}

#[derive(Debug)]
pub struct ImageDetail {
    name: String,
    label: String,
    id: DomId,
    href: Option<String>,
    listeners: EventTarget,
    modal: Option<ImageModal>,
    next_load: u64,
    queued: Option<MediaFetch>,
}

impl ImageDetail {
    pub fn new(name: &str, descriptor: &PropertyDescriptor) -> Self {
        Self {
            name: name.to_owned(),
            label: descriptor.label_or(name).to_owned(),
            id: DomId::new("image", name),
            href: descriptor.image_href().map(str::to_owned),
            listeners: EventTarget::default(),
            modal: None,
            next_load: 0,
            queued: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn listeners(&self) -> &EventTarget {
        &self.listeners
    }

    pub fn attach(&mut self) {
        if self.listeners.is_empty() {
            self.listeners.add(EventKind::Click);
        }
    }

    pub fn is_open(&self) -> bool {
        self.modal.is_some()
    }

    /// The image currently shown in the modal.
    pub fn image(&self) -> Option<&Bytes> {
        self.modal.as_ref().and_then(|modal| modal.image.as_ref())
    }

    /// Opens the modal and queues a fresh fetch of the image.
    pub fn open(&mut self) -> bool {
        if self.href.is_none() {
            tracing::warn!(property = %self.name, "image property has no image link");
            return false;
        }

        if self.modal.is_none() {
            // close and refresh buttons
            let mut listeners = EventTarget::default();
            listeners.add(EventKind::Click);
            listeners.add(EventKind::Click);
            self.modal = Some(ImageModal { load: 0, image: None, listeners });
        }

        self.refresh();
        true
    }

    /// Queues another fetch if the modal is open. The previous image stays
    /// up until the new one arrives.
    pub fn refresh(&mut self) {
        let (Some(modal), Some(href)) = (&mut self.modal, &self.href) else {
            return;
        };

        self.next_load += 1;
        modal.load = self.next_load;

        self.queued = Some(MediaFetch {
            property: self.name.clone(),
            href: href.clone(),
            load: self.next_load,
        });
    }

    pub fn take_fetch(&mut self) -> Option<MediaFetch> {
        self.queued.take()
    }

    /// Shows a fetched image. Returns false if the modal was closed or a
    /// newer fetch has been issued since.
    pub fn loaded(&mut self, load: u64, image: Bytes) -> bool {
        match &mut self.modal {
            Some(modal) if modal.load == load => {
                modal.image = Some(image);
                true
            }
            _ => {
                tracing::debug!(property = %self.name, load, "dropping stale image");
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.modal = None;
        self.queued = None;
    }

    /// The property's value changed; the image behind it probably did too.
    pub fn update(&mut self, _value: Option<&Value>) {
        self.refresh();
    }

    pub fn view(&self) -> String {
        format!(
            r#"<div class="thing-detail-container"><div id="{}" class="thing-detail image-property"><img class="image-property-icon" src="/images/image.svg" alt=""></div><div class="thing-detail-label">{}</div></div>"#,
            self.id,
            escape_html(&self.label),
        )
    }

    pub fn modal_view(&self) -> Option<String> {
        let modal = self.modal.as_ref()?;

        let content = match &modal.image {
            Some(_) => format!(r#"<img class="media-modal-image" src="blob:{}/{}">"#, self.id, modal.load),
            None => r#"<div class="media-modal-loading"></div>"#.to_owned(),
        };

        Some(format!(
            r#"<div class="media-modal-frame"><div class="media-modal"><button class="media-modal-close"></button><button class="media-modal-refresh"></button>{content}</div></div>"#
        ))
    }

    #[cfg(test)]
    fn modal_listeners(&self) -> usize {
        self.modal.as_ref().map_or(0, |modal| modal.listeners.len())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn camera() -> ImageDetail {
        let descriptor = serde_json::from_value::<PropertyDescriptor>(json!({
            "@type": "ImageProperty",
            "readOnly": true,
            "links": [
                { "rel": "alternate", "mediaType": "image/jpeg", "href": "/media/cam/snap.jpg" },
            ],
        }))
        .unwrap();

        ImageDetail::new("snapshot", &descriptor)
    }

    #[test]
    fn fetches_on_every_open() {
        let mut image = camera();
        assert_eq!(image.take_fetch(), None);

        assert!(image.open());
        let first = image.take_fetch().unwrap();
        assert_eq!(first.href, "/media/cam/snap.jpg");
        assert!(image.loaded(first.load, Bytes::from_static(b"one")));
        image.close();

        assert!(image.open());
        let second = image.take_fetch().unwrap();
        assert_ne!(first.load, second.load);
        assert_eq!(image.image(), None);
    }

    #[test]
    fn drops_loads_after_close() {
        let mut image = camera();

        image.open();
        let fetch = image.take_fetch().unwrap();
        image.close();

        assert!(!image.loaded(fetch.load, Bytes::from_static(b"late")));
        assert_eq!(image.modal_view(), None);
    }

    #[test]
    fn refresh_supersedes_pending_load() {
        let mut image = camera();

        image.open();
        let old = image.take_fetch().unwrap();
        image.update(Some(&json!(null)));
        let new = image.take_fetch().unwrap();

        assert!(!image.loaded(old.load, Bytes::from_static(b"old")));
        assert!(image.loaded(new.load, Bytes::from_static(b"new")));
        assert_eq!(image.image().unwrap().as_ref(), b"new");
        assert!(image.modal_view().unwrap().contains("media-modal-image"));
    }

    #[test]
    fn refresh_button_refetches() {
        let mut image = camera();

        image.open();
        assert!(image.modal_view().unwrap().contains("media-modal-refresh"));

        let mut loads = vec![image.take_fetch().unwrap().load];
        for _ in 0..2 {
            image.refresh();
            loads.push(image.take_fetch().unwrap().load);
        }

        assert_eq!(loads, [1, 2, 3]);
    }

    #[test]
    fn closed_modal_does_not_refresh() {
        let mut image = camera();

        image.update(None);
        assert_eq!(image.take_fetch(), None);
    }

    #[test]
    fn modal_listeners_released_on_close() {
        let mut image = camera();
        image.attach();
        image.attach();
        assert_eq!(image.listeners().count(EventKind::Click), 1);

        for _ in 0..3 {
            image.open();
            assert_eq!(image.modal_listeners(), 2);
            image.close();
            assert_eq!(image.modal_listeners(), 0);
        }
    }

    #[test]
    fn missing_link() {
        let mut image = ImageDetail::new("snapshot", &PropertyDescriptor::default());

        assert!(!image.open());
        assert!(!image.is_open());
    }
}
