use tokio_tungstenite::tungstenite;

pub mod client;
pub mod config;
pub mod detail;
pub mod dom;
pub mod form;
pub mod log;
pub mod push;
pub mod sync;
pub mod thing;
pub mod view;

pub use thingview_common as common;

pub use self::{
    client::{HttpClient, Transport},
    config::GatewayConfig,
    thing::Thing,
    view::ThingsView,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("serde json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad url: {0}")]
    Url(#[from] url::ParseError),
    #[error("no {0} endpoint")]
    MissingEndpoint(&'static str),
    #[error("no action named {0}")]
    UnknownAction(String),
    #[error("form error: {0}")]
    Form(#[from] form::FormError),
    #[error("protocol error: {0}")]
    Protocol(String),
}
