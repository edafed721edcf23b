//! Push channel for registry updates.
//!
//! A [`Subscription`] holds one WebSocket to the portal. After the
//! handshake the client sends a single [`SubscribeRequest`] frame; from then
//! on the portal pushes binary signed entries, which are handed to the
//! callback one at a time from a single reader task.

use std::collections::BTreeMap;

use futures::{SinkExt, StreamExt};
use s5_core::{
    PublicKey, RequestOptions, SignedRegistryEntry, TransportError, registry::SubscribeRequest,
};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderName, HeaderValue},
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Options for [`Subscription::open`].
#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    /// Drop pushed entries whose signature does not verify or whose key is
    /// not the subscribed one.
    pub verify: bool,
    /// Headers sent with the WebSocket handshake.
    pub headers: BTreeMap<String, String>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            verify: true,
            headers: BTreeMap::new(),
        }
    }
}

impl SubscribeOptions {
    /// Carries the auth, user agent and custom headers of `options`.
    pub fn from_request(options: &RequestOptions) -> Self {
        Self {
            verify: true,
            headers: options.resolve().header_pairs().into_iter().collect(),
        }
    }
}

/// An open registry subscription.
///
/// Dropping the handle ends the subscription.
#[derive(Debug)]
pub struct Subscription {
    public_key: PublicKey,
    token: CancellationToken,
    task: Option<JoinHandle<Result<(), TransportError>>>,
}

impl Subscription {
    /// Connects to `url` (a `ws://` or `wss://` subscribe endpoint) and
    /// subscribes to updates for `public_key`.
    pub async fn open<F>(
        url: &str,
        public_key: PublicKey,
        options: SubscribeOptions,
        on_entry: F,
    ) -> Result<Self, TransportError>
    where
        F: FnMut(SignedRegistryEntry) + Send + 'static,
    {
        let mut request = url.into_client_request().map_err(ws_error)?;
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(anyhow::Error::from)?;
            let value = HeaderValue::from_str(value).map_err(anyhow::Error::from)?;
            request.headers_mut().insert(name, value);
        }

        let (mut stream, _) = connect_async(request).await.map_err(ws_error)?;
        stream
            .send(Message::Binary(SubscribeRequest::new(public_key).encode().to_vec()))
            .await
            .map_err(ws_error)?;
        debug!("subscribed to registry updates for {public_key} at {url}");

        let token = CancellationToken::new();
        let task = tokio::spawn(read_frames(
            stream,
            token.clone(),
            public_key,
            options.verify,
            on_entry,
        ));

        Ok(Self {
            public_key,
            token,
            task: Some(task),
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Stops delivery and closes the socket. Safe to call more than once.
    pub fn end(&self) {
        self.token.cancel();
    }

    /// Whether the subscription was ended or the portal closed the socket.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Waits for the reader task to stop and returns the error that stopped
    /// it, if any.
    pub async fn closed(mut self) -> Result<(), TransportError> {
        match self.task.take() {
            Some(task) => task.await.map_err(anyhow::Error::from)?,
            None => Ok(()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn read_frames<F>(
    stream: WsStream,
    token: CancellationToken,
    public_key: PublicKey,
    verify: bool,
    mut on_entry: F,
) -> Result<(), TransportError>
where
    F: FnMut(SignedRegistryEntry) + Send + 'static,
{
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                // The portal may already be gone.
                let _ = sink.send(Message::Close(None)).await;
                debug!("registry subscription for {public_key} ended");
                return Ok(());
            }
            frame = source.next() => match frame {
                None | Some(Ok(Message::Close(_))) => {
                    debug!("portal closed registry subscription for {public_key}");
                    return Ok(());
                }
                Some(Err(err)) => return Err(ws_error(err)),
                Some(Ok(Message::Binary(bytes))) => {
                    if let Some(entry) = accept_frame(&bytes, &public_key, verify) {
                        on_entry(entry);
                    }
                }
                Some(Ok(_)) => {}
            }
        }
    }
}

fn accept_frame(bytes: &[u8], public_key: &PublicKey, verify: bool) -> Option<SignedRegistryEntry> {
    let entry = match SignedRegistryEntry::decode(bytes) {
        Ok(entry) => entry,
        Err(err) => {
            warn!("registry subscription: skipping malformed frame: {err}");
            return None;
        }
    };
    if !verify {
        return Some(entry);
    }
    if entry.public_key() != public_key {
        warn!(
            "registry subscription: skipping entry for {}, subscribed to {public_key}",
            entry.public_key()
        );
        return None;
    }
    if !entry.verify() {
        warn!(
            "registry subscription: skipping entry with invalid signature at revision {}",
            entry.revision()
        );
        return None;
    }
    Some(entry)
}

fn ws_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::Http(response) => {
            let status = response.status();
            let message = response
                .body()
                .as_deref()
                .map(|body| String::from_utf8_lossy(body).into_owned())
                .filter(|body| !body.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_owned());
            TransportError::Status {
                status: status.as_u16(),
                message,
            }
        }
        err => TransportError::Other(err.into()),
    }
}
