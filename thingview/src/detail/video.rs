use reqwest::header::HeaderMap;
use thingview_common::{DomId, PropertyDescriptor, utils::escape_html};

use crate::dom::{EventKind, EventTarget, ListenerId};

/// Adds credentials to every request the player makes.
pub type RequestFilter = Box<dyn Fn(&mut HeaderMap)>;

/// An adaptive-streaming player. Its internals are not our business; it is
/// handed a manifest and a way to authorize its requests.
pub trait StreamingPlayer {
    fn set_request_filter(&mut self, filter: RequestFilter);
    fn load(&mut self, manifest: &str);
    /// Stops playback and releases everything the player holds.
    fn destroy(&mut self);
}

struct VideoModal {
    player: Box<dyn StreamingPlayer>,
    resize: ListenerId,
    video: EventTarget,
    close_offset: f64,
}

impl core::fmt::Debug for VideoModal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VideoModal")
            .field("resize", &self.resize)
            .field("video", &self.video)
            .field("close_offset", &self.close_offset)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct VideoDetail {
    name: String,
    label: String,
    id: DomId,
    manifest: Option<String>,
    listeners: EventTarget,
    modal: Option<VideoModal>,
}

/// Right offset that keeps the close button over the video's corner when
/// the video is narrower than its frame.
pub fn close_button_offset(parent_width: f64, video_width: f64) -> f64 {
    (parent_width - video_width) / 2.0
}

impl VideoDetail {
    pub fn new(name: &str, descriptor: &PropertyDescriptor) -> Self {
        // DASH, else HLS
        let manifest = descriptor.dash_href().or(descriptor.hls_href()).map(str::to_owned);

        Self {
            name: name.to_owned(),
            label: descriptor.label_or(name).to_owned(),
            id: DomId::new("video", name),
            manifest,
            listeners: EventTarget::default(),
            modal: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest(&self) -> Option<&str> {
        self.manifest.as_deref()
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

    /// Opens the modal and starts `player` on the manifest.
    ///
    /// `window` gets a resize listener for as long as the modal is open.
    pub fn open(
        &mut self,
        window: &mut EventTarget,
        mut player: Box<dyn StreamingPlayer>,
        filter: RequestFilter,
    ) -> bool {
        let Some(manifest) = self.manifest.clone() else {
            tracing::warn!(property = %self.name, "video property has no manifest link");
            return false;
        };

        if self.modal.is_some() {
            self.close(window);
        }

        player.set_request_filter(filter);
        player.load(&manifest);

        let mut video = EventTarget::default();
        video.add(EventKind::LoadedData);

        self.modal = Some(VideoModal {
            player,
            resize: window.add(EventKind::Resize),
            video,
            close_offset: 0.0,
        });

        true
    }

    /// Repositions the close button; run on resize and once the first frame
    /// is in.
    pub fn position_buttons(&mut self, parent_width: f64, video_width: f64) -> Option<f64> {
        let modal = self.modal.as_mut()?;
        modal.close_offset = close_button_offset(parent_width, video_width);
        Some(modal.close_offset)
    }

    pub fn close(&mut self, window: &mut EventTarget) {
        let Some(mut modal) = self.modal.take() else {
            return;
        };

        modal.player.destroy();
        window.remove(modal.resize);
    }

    pub fn view(&self) -> String {
        format!(
            r#"<div class="thing-detail-container"><div id="{}" class="thing-detail video-property"><img class="video-property-icon" src="/images/video.svg" alt=""></div><div class="thing-detail-label">{}</div></div>"#,
            self.id,
            escape_html(&self.label),
        )
    }

    pub fn modal_view(&self) -> Option<String> {
        let modal = self.modal.as_ref()?;

        Some(format!(
            r#"<div class="media-modal-frame"><div class="media-modal"><button class="media-modal-close" style="right: {}px"></button><video class="media-modal-video" autoplay></video></div></div>"#,
            modal.close_offset,
        ))
    }

    #[cfg(test)]
    fn video_listeners(&self) -> usize {
        self.modal.as_ref().map_or(0, |modal| modal.video.len())
    }
}
