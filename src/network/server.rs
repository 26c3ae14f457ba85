//! WebSocket Game Server
//!
//! Accepts connections, assigns each one a client identity and relays
//! frames between the socket and the session coordinator.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, OwnedSemaphorePermit, RwLock, Semaphore};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{env_parse, ConfigError};
use crate::game::state::ClientId;
use crate::network::protocol::{ClientMessage, Frame, ServerMessage};
use crate::network::session::{SessionError, SessionHandle};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Per-client outbound queue capacity.
    pub outbox_capacity: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            max_connections: 1000,
            outbox_capacity: 64,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// Reads `MAZE_RACE_HOST`, `PORT` and `MAZE_RACE_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = env_parse::<IpAddr>("MAZE_RACE_HOST")?.unwrap_or(defaults.bind_addr.ip());
        let port = env_parse::<u16>("PORT")?.unwrap_or(defaults.bind_addr.port());
        let max_connections = env_parse::<usize>("MAZE_RACE_MAX_CONNECTIONS")?
            .unwrap_or(defaults.max_connections);

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            max_connections,
            ..defaults
        })
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Connected client state.
struct ConnectedClient {
    /// Assigned identity.
    client_id: ClientId,
    /// Connection time.
    connected_at: Instant,
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Session coordinator.
    session: SessionHandle,
    /// Open sockets.
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    /// One permit per connection slot, taken at accept.
    slots: Arc<Semaphore>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server in front of a running session.
    pub fn new(config: ServerConfig, session: SessionHandle) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let slots = Arc::new(Semaphore::new(config.max_connections.min(Semaphore::MAX_PERMITS)));

        Self {
            config,
            session,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            slots,
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self), fields(addr = %self.config.bind_addr))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server v{} listening on {}", self.config.version, listener.local_addr()?);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let Ok(slot) = self.slots.clone().try_acquire_owned() else {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            };

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr, slot);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection. `slot` is released when the
    /// connection task ends.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr, slot: OwnedSemaphorePermit) {
        let clients = self.clients.clone();
        let session = self.session.clone();
        let outbox_capacity = self.config.outbox_capacity;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let _slot = slot;
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<Frame>(outbox_capacity);
            let client_id = ClientId::generate();

            // Register client
            {
                let mut clients = clients.write().await;
                clients.insert(addr, ConnectedClient {
                    client_id: client_id.clone(),
                    connected_at: Instant::now(),
                });
            }

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(frame) = msg_rx.recv().await {
                    if ws_sender.send(Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
            });

            if let Err(e) = session.connect(client_id.clone(), msg_tx.clone()).await {
                error!("Cannot register {}: {}", client_id, e);
            } else {
                // Handle incoming messages
                loop {
                    tokio::select! {
                        msg = ws_receiver.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    let client_msg = match ClientMessage::from_json(&text) {
                                        Ok(m) => m,
                                        Err(e) => {
                                            debug!("Invalid message from {}: {}", client_id, e);
                                            continue;
                                        }
                                    };

                                    if let Err(e) = Self::handle_client_message(
                                        &client_id,
                                        client_msg,
                                        &session,
                                        &msg_tx,
                                    ).await {
                                        error!("Dropping {}: {}", client_id, e);
                                        break;
                                    }
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    debug!("Client {} disconnected", client_id);
                                    break;
                                }
                                Some(Err(e)) => {
                                    error!("WebSocket error for {}: {}", client_id, e);
                                    break;
                                }
                                _ => {}
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }

                let _ = session.disconnect(client_id.clone()).await;
            }

            // Cleanup
            drop(msg_tx);
            sender_task.abort();

            let mut clients = clients.write().await;
            if let Some(client) = clients.remove(&addr) {
                info!(
                    "Client {} ({}) cleaned up after {:?}",
                    client.client_id,
                    addr,
                    client.connected_at.elapsed()
                );
            }
        });
    }

    /// Handle a client message.
    async fn handle_client_message(
        client_id: &ClientId,
        msg: ClientMessage,
        session: &SessionHandle,
        sender: &mpsc::Sender<Frame>,
    ) -> Result<(), GameServerError> {
        match msg {
            ClientMessage::Update(update) => {
                session.update_position(client_id.clone(), update).await?;
            }
            ClientMessage::MapRequest => {
                debug!("Map requested by {}", client_id);
                let snapshot = session.map_snapshot().await?;
                match ServerMessage::Map(snapshot).to_frame() {
                    Ok(frame) => {
                        if sender.try_send(frame).is_err() {
                            warn!("Could not queue map for {}", client_id);
                        }
                    }
                    Err(e) => error!("Failed to serialize map: {}", e),
                }
            }
        }
        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }
}
