//! Message transport to the game server.
//!
//! A [`Connector`] opens one connection and hands back a [`Link`]: a pair of
//! channels pumped by a background task. Dropping the link closes the socket.

pub mod connector;

use crate::error::TransportError;
use std::future::Future;
use tokio::sync::mpsc;
use url::Url;

pub use connector::WsConnector;

/// Something the socket pump reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    /// Socket is gone; the optional reason comes from the close frame or
    /// the error that ended it.
    Closed(Option<String>),
}

/// An open connection.
#[derive(Debug)]
pub struct Link {
    pub outbound: mpsc::Sender<String>,
    pub inbound: mpsc::Receiver<TransportEvent>,
}

pub trait Connector: Send + Sync + 'static {
    /// Resolves once the transport is open.
    fn connect(&self, url: Url) -> impl Future<Output = Result<Link, TransportError>> + Send;
}

/// Connection URI with the bearer token as `token` query parameter.
pub fn endpoint(ws_url: &str, token: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(ws_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}
