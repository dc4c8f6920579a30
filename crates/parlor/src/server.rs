//! `GameServer` builder and accept loop.
//!
//! One `GameServer` serves one game variant on one port. It ties the
//! layers together: transport → handshake/queue → room actors.

use std::sync::Arc;

use parlor_room::{GameRules, MatchQueue, ScoreStore};
use parlor_transport::{TcpLineTransport, Transport};

use crate::ParlorError;
use crate::handler::{Waiting, handle_connection};
use crate::services::NameResolver;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<G: GameRules, S: ScoreStore, N: NameResolver> {
    /// Players waiting for an opponent.
    pub(crate) queue: MatchQueue<Waiting<G>>,
    /// Game settings applied to every room this server spawns.
    pub(crate) game_config: G::Config,
    /// Score persistence service, shared with every room.
    pub(crate) store: Arc<S>,
    /// Identity → display name service.
    pub(crate) names: N,
}

/// Builder for configuring and starting a [`GameServer`].
///
/// # Example
///
/// ```rust,ignore
/// let server = GameServerBuilder::new()
///     .bind("0.0.0.0:5555")
///     .build::<MemoryGame, _, _>(MemoryConfig::default(), NullScoreStore, EchoNames)
///     .await?;
/// server.run().await
/// ```
pub struct GameServerBuilder {
    bind_addr: String,
}

impl GameServerBuilder {
    /// Creates a new builder bound to an ephemeral localhost port.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }

    /// Sets the address to bind the server to. Each game variant has a
    /// conventional port (`games::*::DEFAULT_PORT`), but the choice is
    /// configuration, not protocol.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and assembles the server with its services.
    ///
    /// # Errors
    /// Returns a transport error when the address cannot be bound.
    pub async fn build<G, S, N>(
        self,
        game_config: G::Config,
        store: S,
        names: N,
    ) -> Result<GameServer<G, S, N>, ParlorError>
    where
        G: GameRules,
        S: ScoreStore,
        N: NameResolver,
    {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            queue: MatchQueue::new(),
            game_config,
            store: Arc::new(store),
            names,
        });

        Ok(GameServer { transport, state })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running game server for one variant.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GameServer<G: GameRules, S: ScoreStore, N: NameResolver> {
    transport: TcpLineTransport,
    state: Arc<ServerState<G, S, N>>,
}

impl<G, S, N> GameServer<G, S, N>
where
    G: GameRules,
    S: ScoreStore,
    N: NameResolver,
{
    /// Creates a new builder.
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated; a failed accept is logged
    /// and does not stop the loop.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("game server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<G, S, N>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
