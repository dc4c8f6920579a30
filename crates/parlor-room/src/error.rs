//! Error types for the room layer.

use crate::RoomId;

/// Errors that can occur when talking to a room actor.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's mailbox is closed: the game is over and the actor has
    /// exited. Callers drop the event — a player lingering after their
    /// match ends is normal, not a fault.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
