//! WebSocket transport
//!
//! Accepts TCP connections, upgrades them to WebSocket, and bridges each
//! socket to the relay task: inbound frames become [`RelayEvent`]s, and
//! the relay's outbound queue for the connection is drained into the
//! socket by a writer task.

use crate::config::Config;
use crate::connection::ConnectionId;
use crate::error::RelayError;
use crate::relay::{Relay, RelayEvent, RelayHandle};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Inbound events buffered for the relay task
const RELAY_QUEUE_CAPACITY: usize = 1024;

/// How long shutdown waits for open connections to report their close
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// Per-connection settings taken from [`Config`]
#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    send_queue_capacity: usize,
    heartbeat: Option<Duration>,
}

/// A bound relay server
pub struct RelayServer {
    listener: TcpListener,
    settings: ConnectionSettings,
}

impl RelayServer {
    /// Bind the listener described by `config`
    pub async fn bind(config: &Config) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self {
            listener,
            settings: ConnectionSettings {
                send_queue_capacity: config.send_queue_capacity(),
                heartbeat: config.heartbeat_interval(),
            },
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), RelayError> {
        let (relay, relay_task) = Relay::new().spawn(RELAY_QUEUE_CAPACITY);
        info!(address = %self.local_addr()?, "relay listening");

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(serve_connection(
                        stream,
                        peer,
                        relay.clone(),
                        self.settings,
                        shutdown.clone(),
                    ));
                }
                Err(e) => warn!(error = %e, "failed to accept connection"),
            }
        }

        // The relay task ends once every connection task has dropped its handle
        drop(relay);
        if tokio::time::timeout(SHUTDOWN_GRACE, relay_task).await.is_err() {
            warn!("relay did not drain before shutdown timeout");
        }
        info!("relay stopped");
        Ok(())
    }
}

/// Upgrade one socket and pump frames until either side goes away
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    relay: RelayHandle,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };

    let connection = ConnectionId::new();
    let (outbox, queue) = mpsc::channel(settings.send_queue_capacity);
    if !relay.submit(RelayEvent::Opened { connection, outbox }).await {
        return;
    }
    debug!(%connection, %peer, "websocket accepted");

    let (sink, source) = socket.split();
    let mut writer = tokio::spawn(write_frames(sink, queue, settings.heartbeat));

    tokio::select! {
        _ = read_frames(source, connection, &relay) => {}
        _ = &mut writer => {}
        _ = shutdown.cancelled() => {}
    }
    writer.abort();

    // Nothing from this connection is submitted after this point
    let _ = relay.submit(RelayEvent::Closed { connection }).await;
    debug!(%connection, %peer, "websocket closed");
}

async fn read_frames(mut source: WsSource, connection: ConnectionId, relay: &RelayHandle) {
    while let Some(frame) = source.next().await {
        let event = match frame {
            Ok(Message::Text(text)) => RelayEvent::Text {
                connection,
                text: text.to_string(),
            },
            Ok(Message::Binary(bytes)) => RelayEvent::Binary {
                connection,
                bytes: bytes.to_vec(),
            },
            Ok(Message::Close(_)) => break,
            // Ping replies are queued by tungstenite itself
            Ok(_) => continue,
            Err(e) => {
                debug!(%connection, error = %e, "websocket read failed");
                break;
            }
        };
        if !relay.submit(event).await {
            break;
        }
    }
}

async fn write_frames(
    mut sink: WsSink,
    mut queue: mpsc::Receiver<String>,
    heartbeat: Option<Duration>,
) {
    let mut ticker = heartbeat.map(|period| tokio::time::interval_at(Instant::now() + period, period));

    loop {
        let frame = tokio::select! {
            queued = queue.recv() => match queued {
                Some(text) => Message::text(text),
                None => break,
            },
            _ = next_tick(&mut ticker) => Message::Ping(Default::default()),
        };
        if sink.send(frame).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
