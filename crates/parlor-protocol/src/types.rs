//! Identity types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A player's display name.
///
/// Assigned once at handshake (the first line a client sends, resolved
/// through the server's name service) and immutable afterwards. It is the
/// only identity a connection carries.
///
/// `#[serde(transparent)]` keeps the name a plain string wherever records
/// containing it are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(pub String);

impl PlayerName {
    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// One of the two player slots in a room.
///
/// Slot A is always the first player taken from the matchmaking queue and
/// slot B the second; the assignment never changes for the life of the
/// room. Games attach their own meaning (slot A is `X` and moves first in
/// tic-tac-toe, slot A is player 1 in the maze race).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// The opposing slot.
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    /// Index into two-element per-slot arrays (`A` = 0, `B` = 1).
    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// Who should receive an outbound message.
///
/// Game rules return `(Recipient, message)` pairs; the room resolves each
/// recipient to the concrete slot(s). With exactly two players the three
/// cases below cover everything a game ever needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Both players.
    Both,
    /// The named slot only.
    To(Slot),
    /// The slot opposite the named one — "everyone but the sender".
    OpponentOf(Slot),
}
