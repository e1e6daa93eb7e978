//! The websocket a gateway pushes a thing's property changes over.

use futures::StreamExt as _;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thingview_common::ThingId;
use tokio::{net::TcpStream, sync::mpsc::UnboundedSender};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        Message,
        client::IntoClientRequest as _,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};

use crate::{Error, GatewayConfig, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    PropertyStatus(IndexMap<String, Value>),
    /// `connected`, `actionStatus`, `event` and anything newer.
    Other(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    message_type: String,
    #[serde(default)]
    data: Value,
}

impl PushMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let raw = serde_json::from_str::<RawMessage>(text)?;

        Ok(match raw.message_type.as_str() {
            "propertyStatus" => Self::PropertyStatus(serde_json::from_value(raw.data)?),
            _ => Self::Other(raw.message_type),
        })
    }
}

/// A property value pushed by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    pub thing: ThingId,
    pub property: String,
    pub value: Value,
}

pub struct PushChannel {
    thing: ThingId,
    conn: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl PushChannel {
    pub async fn connect(config: &GatewayConfig, thing: ThingId, thing_href: &str) -> Result<Self> {
        let url = config.push_url(thing_href)?;

        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::Protocol(format!("credential is not a valid header: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (conn, res) = tokio_tungstenite::connect_async(request).await?;

        tracing::debug!("WebSocket response: {res:?}");
        tracing::info!(%thing, "push channel open");

        Ok(Self { thing, conn })
    }

    pub fn thing(&self) -> &ThingId {
        &self.thing
    }

    /// Waits for the next batch of property changes. `None` once the gateway
    /// closes the connection.
    pub async fn recv(&mut self) -> Option<Result<Vec<PushEvent>>> {
        loop {
            let msg = match self.conn.next().await? {
                Ok(msg) => msg,
                Err(e) => return Some(Err(Error::WebSocket(e))),
            };

            let txt = match msg {
                Message::Text(txt) => txt,
                Message::Close(_) => return None,
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
                Message::Binary(_) => {
                    tracing::warn!(thing = %self.thing, "expected text message, got binary");
                    continue;
                }
            };

            match PushMessage::parse(&txt) {
                Ok(PushMessage::PropertyStatus(values)) => {
                    return Some(Ok(events(&self.thing, values)));
                }
                Ok(PushMessage::Other(kind)) => {
                    tracing::debug!(thing = %self.thing, "skipping {kind} message");
                }
                Err(e) => {
                    tracing::warn!(thing = %self.thing, "bad push message: {e}");
                }
            }
        }
    }

    /// Feeds events into `tx` until either side goes away.
    pub async fn forward(mut self, tx: UnboundedSender<PushEvent>) -> Result<()> {
        while let Some(batch) = self.recv().await {
            for event in batch? {
                if tx.send(event).is_err() {
                    return Ok(());
                }
            }
        }

        tracing::info!(thing = %self.thing, "push channel closed");
        Ok(())
    }
}

fn events(thing: &ThingId, values: IndexMap<String, Value>) -> Vec<PushEvent> {
    values
        .into_iter()
        .map(|(property, value)| PushEvent { thing: thing.clone(), property, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_property_status() {
        let msg = PushMessage::parse(
            r#"{"id":"lamp","messageType":"propertyStatus","data":{"on":true,"level":40}}"#,
        )
        .unwrap();

        let PushMessage::PropertyStatus(values) = msg else {
            panic!("expected property status");
        };
        assert_eq!(values.keys().collect::<Vec<_>>(), ["on", "level"]);

        let thing = ThingId::from("lamp");
        assert_eq!(events(&thing, values), [
            PushEvent { thing: thing.clone(), property: "on".to_owned(), value: json!(true) },
            PushEvent { thing: thing.clone(), property: "level".to_owned(), value: json!(40) },
        ]);
    }

    #[test]
    fn other_messages() {
        assert_eq!(
            PushMessage::parse(r#"{"messageType":"connected","data":true}"#).unwrap(),
            PushMessage::Other("connected".to_owned())
        );
        assert_eq!(
            PushMessage::parse(r#"{"messageType":"event"}"#).unwrap(),
            PushMessage::Other("event".to_owned())
        );
        assert!(PushMessage::parse(r#"{"messageType":"propertyStatus","data":[1]}"#).is_err());
        assert!(PushMessage::parse("not json").is_err());
    }
}
