//! The three game variants.
//!
//! Each module defines one game's wire vocabulary (client and server
//! message enums, both [`Wire`](parlor_protocol::Wire)-convertible), its
//! [`GameRules`](parlor_room::GameRules) implementation, and its
//! conventional port. The handshake, queue, and room plumbing is shared;
//! only the vocabulary and rules differ.

pub mod memory;
pub mod pacman;
pub mod tictactoe;
