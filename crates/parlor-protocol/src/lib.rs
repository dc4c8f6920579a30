//! Wire protocol for Parlor.
//!
//! Every message on the wire is one newline-delimited UTF-8 line whose
//! fields are separated by `:`, the first field being the command name —
//! `MOVE:1:2:X`, `MATCH_SUCCESS:0:5`, `OPPONENT_DISCONNECTED`. This crate
//! defines that format and nothing else:
//!
//! - **[`Frame`]** — one parsed line (command + fields).
//! - **[`Wire`]** — conversion between typed game messages and frames.
//! - **Identity types** ([`PlayerName`], [`Slot`], [`Recipient`]) — who
//!   sent a message and who should receive one.
//! - **[`ProtocolError`]** — what can go wrong while decoding.
//!
//! The protocol layer sits between transport (lines of text) and the room
//! layer (typed events). It knows nothing about sockets or game rules.

mod codec;
mod error;
mod types;

pub use codec::{Frame, Wire};
pub use error::ProtocolError;
pub use types::{PlayerName, Recipient, Slot};
