//! Per-property renderers shown on a thing's detail page.
//!
//! Each one wraps a single property. `attach` wires listeners once, `view`
//! only reads, and `update` can be repeated with the same value without
//! changing what is shown.

use serde_json::Value;
use thingview_common::{PropertyDescriptor, capabilities::semantic, utils::escape_html};

mod image;
mod input;
mod label;
mod video;

pub use self::{
    image::{ImageDetail, MediaFetch},
    input::{CommitError, Control, InputDetail},
    label::{LabelDetail, TRANSITION_TEXT},
    video::{RequestFilter, StreamingPlayer, VideoDetail, close_button_offset},
};

#[derive(Debug)]
pub enum PropertyDetail {
    Input(InputDetail),
    Label(LabelDetail),
    Image(ImageDetail),
    Video(VideoDetail),
}

impl PropertyDetail {
    pub fn new(name: &str, descriptor: &PropertyDescriptor) -> Self {
        if descriptor.image_href().is_some() || descriptor.has_semantic(semantic::IMAGE) {
            Self::Image(ImageDetail::new(name, descriptor))
        } else if descriptor.dash_href().is_some()
            || descriptor.hls_href().is_some()
            || descriptor.has_semantic(semantic::VIDEO)
        {
            Self::Video(VideoDetail::new(name, descriptor))
        } else if descriptor.read_only {
            Self::Label(LabelDetail::new(name, descriptor))
        } else {
            Self::Input(InputDetail::new(name, descriptor))
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Input(detail) => detail.name(),
            Self::Label(detail) => detail.name(),
            Self::Image(detail) => detail.name(),
            Self::Video(detail) => detail.name(),
        }
    }

    pub fn attach(&mut self) {
        match self {
            Self::Input(detail) => detail.attach(),
            Self::Label(_) => {}
            Self::Image(detail) => detail.attach(),
            Self::Video(detail) => detail.attach(),
        }
    }

    pub fn view(&self) -> String {
        match self {
            Self::Input(detail) => detail.view(),
            Self::Label(detail) => detail.view(),
            Self::Image(detail) => detail.view(),
            Self::Video(detail) => detail.view(),
        }
    }

    /// Shows `value`, or the transition state for `None`.
    pub fn update(&mut self, value: Option<&Value>) {
        match self {
            Self::Input(detail) => detail.update(value),
            Self::Label(detail) => detail.update(value),
            Self::Image(detail) => detail.update(value),
            Self::Video(_) => {}
        }
    }

    pub fn as_input(&self) -> Option<&InputDetail> {
        match self {
            Self::Input(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_input_mut(&mut self) -> Option<&mut InputDetail> {
        match self {
            Self::Input(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageDetail> {
        match self {
            Self::Image(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_video_mut(&mut self) -> Option<&mut VideoDetail> {
        match self {
            Self::Video(detail) => Some(detail),
            _ => None,
        }
    }
}

fn container(label: &str, inner: &str) -> String {
    format!(
        r#"<div class="thing-detail-container"><div class="thing-detail">{inner}</div><div class="thing-detail-label">{}</div></div>"#,
        escape_html(label)
    )
}

fn unit_span(unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!(r#"<span class="thing-detail-unit">{}</span>"#, escape_html(unit)),
        None => String::new(),
    }
}
