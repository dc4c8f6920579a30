//! # Parlor
//!
//! A TCP server that pairs remote players and arbitrates three two-player
//! mini games: turn-based tic-tac-toe, a concurrent card-matching memory
//! race, and a pacman-style maze race. Each game variant runs as its own
//! [`GameServer`] on its own port; all three share the same plumbing:
//!
//! 1. A client connects and sends its name as the first line.
//! 2. The server answers `WAITING` and queues the connection.
//! 3. The two oldest waiting players are paired into a room — an isolated
//!    task owning the authoritative game state.
//! 4. Lines flow client → room as typed messages; the room answers one or
//!    both players until the game ends or someone disconnects.
//!
//! ```rust,no_run
//! use parlor::games::tictactoe::TicTacToe;
//! use parlor::{EchoNames, GameServerBuilder};
//! use parlor_room::NullScoreStore;
//!
//! # async fn run() -> Result<(), parlor::ParlorError> {
//! let server = GameServerBuilder::new()
//!     .bind("0.0.0.0:5557")
//!     .build::<TicTacToe, _, _>((), NullScoreStore, EchoNames)
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod games;

mod error;
mod handler;
mod server;
mod services;

pub use error::ParlorError;
pub use server::{GameServer, GameServerBuilder};
pub use services::{EchoNames, NameResolver};
