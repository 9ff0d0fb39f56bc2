//! WebSocket transport built on tokio-tungstenite.

use crate::{
    error::TransportError,
    ws::{Connector, Link, TransportEvent},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};
use url::Url;

#[derive(Debug, Clone)]
pub struct WsConnector {
    capacity: usize,
}

impl WsConnector {
    pub fn new(capacity: usize) -> Self {
        WsConnector {
            capacity: capacity.max(1),
        }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        WsConnector::new(64)
    }
}

fn classify(url: &Url, err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::Http(resp) if matches!(resp.status().as_u16(), 401 | 403) => {
            TransportError::Unauthorized {
                status: resp.status().as_u16(),
            }
        }
        tungstenite::Error::Url(e) => TransportError::InvalidUrl(e.to_string()),
        other => TransportError::Unreachable {
            url: redact(url),
            message: other.to_string(),
        },
    }
}

/// The token must not end up in logs.
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

impl Connector for WsConnector {
    async fn connect(&self, url: Url) -> Result<Link, TransportError> {
        let (stream, _resp) = connect_async(url.as_str())
            .await
            .map_err(|e| classify(&url, e))?;
        log::info!("WS open to {}", redact(&url));

        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(self.capacity);
        let (in_tx, in_rx) = mpsc::channel::<TransportEvent>(self.capacity);

        tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    // server → client
                    frame = source.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if in_tx.send(TransportEvent::Text(text)).await.is_err() {
                                break None;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            break frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break Some(e.to_string()),
                        None => break None,
                    },
                    // client → server
                    out = out_rx.recv() => match out {
                        Some(text) => {
                            if let Err(e) = sink.send(Message::Text(text)).await {
                                break Some(e.to_string());
                            }
                        }
                        None => {
                            // link dropped locally
                            let _ = sink.close().await;
                            return;
                        }
                    },
                }
            };
            log::info!("WS closed: {}", reason.as_deref().unwrap_or("no reason"));
            let _ = in_tx.send(TransportEvent::Closed(reason)).await;
        });

        Ok(Link {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
