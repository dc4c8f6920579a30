//! Room lifecycle management for Parlor.
//!
//! A room is the authoritative state container for one match between
//! exactly two players. Each room runs as an isolated Tokio task (actor
//! model) that owns the game state outright: the two connection read
//! loops, and any deferred timers, talk to it only through its command
//! mailbox, which serializes every mutation without locks.
//!
//! # Key types
//!
//! - [`GameRules`] — the trait each game variant implements
//! - [`spawn_room`] / [`RoomHandle`] — start a room for a matched pair
//!   and feed it events
//! - [`MatchQueue`] — FIFO pairing of waiting players
//! - [`ScoreStore`] / [`MatchRecord`] — the injected persistence service

mod error;
mod queue;
mod room;
mod rules;
mod store;

pub use error::RoomError;
pub use queue::{MatchQueue, Ticket};
pub use room::{PlayerSender, RoomHandle, RoomId, spawn_room};
pub use rules::{GameRules, Step};
pub use store::{MatchRecord, NullScoreStore, ScoreStore};
