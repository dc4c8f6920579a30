//! The `GameRules` trait — the extension point each game variant implements.
//!
//! The room actor calls these methods at the right time; the game just
//! mutates its own state and describes the outcome as a [`Step`]. Rules
//! never touch sockets, channels, or clocks — anything time-delayed is
//! expressed as a scheduled [`Timer`](GameRules::Timer) that the actor
//! delivers back later.

use std::time::Duration;

use parlor_protocol::{PlayerName, Recipient, Slot, Wire};

use crate::MatchRecord;

/// Rules for one game variant.
///
/// Associated types define the shape of the game's data:
/// - `Config` — per-server settings (e.g. the memory game's resolution delay)
/// - `ClientMessage` / `ServerMessage` — the game's wire vocabulary, both
///   ends typed and [`Wire`]-convertible
/// - `Timer` — the payload of a deferred step delivered by the actor after
///   a delay; games without one use [`std::convert::Infallible`]
///
/// A room is born from a matched pair, so `start` receives both players
/// up front — there is no join phase and slots never change.
pub trait GameRules: Send + Sized + 'static {
    /// Game-specific configuration, fixed for the life of a server.
    type Config: Clone + Default + Send + Sync + 'static;

    /// Messages clients send to the room.
    type ClientMessage: Wire + Send + 'static;

    /// Messages the room sends to clients. `Clone` because a broadcast
    /// goes down two channels.
    type ServerMessage: Wire + Clone + Send + 'static;

    /// Payload of a deferred step scheduled via [`Step::schedule`].
    type Timer: Send + 'static;

    /// Creates the initial game state for a freshly matched pair.
    /// `players[0]` is slot A, `players[1]` slot B.
    fn start(config: &Self::Config, players: [PlayerName; 2]) -> Self;

    /// Produces the opening messages (symbol assignment, shared layout,
    /// initial scores) sent as soon as the room starts.
    fn on_start(&mut self) -> Step<Self>;

    /// Processes one message from a player. This is where game rules live.
    fn on_message(
        &mut self,
        sender: Slot,
        msg: Self::ClientMessage,
    ) -> Step<Self>;

    /// Processes a deferred timer scheduled by an earlier step.
    ///
    /// Called even when the game has already finished — the mutation
    /// still applies, only the resulting messages go undelivered.
    fn on_timer(&mut self, timer: Self::Timer) -> Step<Self>;

    /// Called when a player's connection is gone. Expected to finish the
    /// game and notify the survivor.
    fn on_disconnect(&mut self, slot: Slot) -> Step<Self>;

    /// Returns `true` once the game reached a terminal state
    /// (win/draw/tie/disconnect). Checked by the actor after every step.
    fn is_finished(&self) -> bool;
}

/// The outcome of one rules invocation: messages to deliver, timers to
/// schedule, and match records to persist.
pub struct Step<G: GameRules> {
    /// Outbound messages, delivered in order.
    pub messages: Vec<(Recipient, G::ServerMessage)>,
    /// Deferred steps: after each `Duration`, the actor feeds the timer
    /// back into [`GameRules::on_timer`] without blocking anyone.
    pub timers: Vec<(Duration, G::Timer)>,
    /// Finished-match records handed to the [`ScoreStore`](crate::ScoreStore).
    pub records: Vec<MatchRecord>,
}

impl<G: GameRules> Step<G> {
    /// A step that does nothing.
    pub fn none() -> Self {
        Self {
            messages: Vec::new(),
            timers: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Adds an outbound message.
    pub fn send(mut self, to: Recipient, msg: G::ServerMessage) -> Self {
        self.messages.push((to, msg));
        self
    }

    /// Schedules a deferred timer.
    pub fn schedule(mut self, after: Duration, timer: G::Timer) -> Self {
        self.timers.push((after, timer));
        self
    }

    /// Attaches a match record for persistence.
    pub fn persist(mut self, record: MatchRecord) -> Self {
        self.records.push(record);
        self
    }
}

impl<G: GameRules> Default for Step<G> {
    fn default() -> Self {
        Self::none()
    }
}
