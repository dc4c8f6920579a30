//! Room actor: an isolated Tokio task that owns one match.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc mailbox — no shared mutable state, just message
//! passing. The two connection read loops push player messages in;
//! deferred timers re-enter through the same mailbox from spawned sleep
//! tasks, so a pending resolution never occupies a read loop and is
//! serialized with everything else the room does.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parlor_protocol::{PlayerName, Recipient, Slot};
use tokio::sync::mpsc;

use crate::{GameRules, RoomError, ScoreStore, Step};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Mailbox capacity for room commands.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// A unique identifier for a room, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Channel sender for delivering outbound messages to a player's writer
/// task. Unbounded so the actor never blocks on a slow socket.
pub type PlayerSender<G> =
    mpsc::UnboundedSender<<G as GameRules>::ServerMessage>;

/// Commands sent to a room actor through its mailbox.
enum RoomCommand<G: GameRules> {
    /// A decoded game message from one of the two players.
    Message { sender: Slot, msg: G::ClientMessage },
    /// A deferred timer scheduled by an earlier step.
    Timer(G::Timer),
    /// A player's connection is gone.
    Disconnect(Slot),
}

/// Handle to a running room actor. Cheap to clone — just an
/// `mpsc::Sender` wrapper. Each of the two connection handlers holds one.
pub struct RoomHandle<G: GameRules> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

impl<G: GameRules> Clone for RoomHandle<G> {
    fn clone(&self) -> Self {
        Self {
            room_id: self.room_id,
            sender: self.sender.clone(),
        }
    }
}

impl<G: GameRules> RoomHandle<G> {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Delivers a game message from a player (fire-and-forget).
    ///
    /// # Errors
    /// Returns [`RoomError::Unavailable`] once the actor has exited;
    /// callers treat that as "game over" and drop the message.
    pub async fn message(
        &self,
        sender: Slot,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { sender, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Reports that a player's connection is gone.
    ///
    /// # Errors
    /// Returns [`RoomError::Unavailable`] once the actor has exited.
    pub async fn disconnect(&self, slot: Slot) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Disconnect(slot))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<G: GameRules, S: ScoreStore> {
    room_id: RoomId,
    rules: G,
    players: [PlayerName; 2],
    senders: [PlayerSender<G>; 2],
    store: Arc<S>,
    receiver: mpsc::Receiver<RoomCommand<G>>,
    /// Weak mailbox sender for timer tasks. Weak so the actor's own
    /// handle never keeps the mailbox open: once both players' handles
    /// are gone and no timer holds an upgraded sender, `recv` drains to
    /// `None` and the actor exits even mid-game.
    timer_tx: mpsc::WeakSender<RoomCommand<G>>,
    /// Timers scheduled but not yet delivered. The actor only exits once
    /// the game is finished *and* this reaches zero, so a resolution
    /// pending at game end still runs its state mutation.
    pending_timers: usize,
}

impl<G: GameRules, S: ScoreStore> RoomActor<G, S> {
    /// Runs the actor loop until the game is finished and all timers
    /// have fired.
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            slot_a = %self.players[0],
            slot_b = %self.players[1],
            "room started"
        );

        let opening = self.rules.on_start();
        self.apply(opening).await;

        loop {
            if self.rules.is_finished() && self.pending_timers == 0 {
                break;
            }
            let Some(cmd) = self.receiver.recv().await else {
                break;
            };
            match cmd {
                RoomCommand::Message { sender, msg } => {
                    if self.rules.is_finished() {
                        tracing::debug!(
                            room_id = %self.room_id,
                            slot = %sender,
                            "message after game end, ignoring"
                        );
                        continue;
                    }
                    let step = self.rules.on_message(sender, msg);
                    self.apply(step).await;
                }
                RoomCommand::Timer(timer) => {
                    self.pending_timers -= 1;
                    let already_over = self.rules.is_finished();
                    let step = self.rules.on_timer(timer);
                    if already_over {
                        // The mutation stands; the output has nowhere
                        // to go once the room is over.
                        continue;
                    }
                    self.apply(step).await;
                }
                RoomCommand::Disconnect(slot) => {
                    if self.rules.is_finished() {
                        continue;
                    }
                    tracing::info!(
                        room_id = %self.room_id,
                        player = %self.players[slot.index()],
                        "player disconnected"
                    );
                    let step = self.rules.on_disconnect(slot);
                    self.apply(step).await;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room closed");
    }

    /// Applies one step: delivers messages, schedules timers, persists
    /// records.
    async fn apply(&mut self, step: Step<G>) {
        for (recipient, msg) in step.messages {
            match recipient {
                Recipient::Both => {
                    self.send_to(Slot::A, msg.clone());
                    self.send_to(Slot::B, msg);
                }
                Recipient::To(slot) => self.send_to(slot, msg),
                Recipient::OpponentOf(slot) => {
                    self.send_to(slot.other(), msg)
                }
            }
        }

        for (after, timer) in step.timers {
            // Upgrading here means a pending timer holds the mailbox
            // open until it has been delivered.
            let Some(tx) = self.timer_tx.upgrade() else {
                continue;
            };
            self.pending_timers += 1;
            let room_id = self.room_id;
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                if tx.send(RoomCommand::Timer(timer)).await.is_err() {
                    tracing::debug!(
                        %room_id,
                        "room gone before timer fired"
                    );
                }
            });
        }

        for record in step.records {
            let player = record.player.clone();
            if !self.store.persist(record).await {
                tracing::warn!(
                    room_id = %self.room_id,
                    %player,
                    "score store rejected match record"
                );
            }
        }
    }

    /// Sends an outbound message to a single player. Silently drops it
    /// if the receiver is gone (player disconnected).
    fn send_to(&self, slot: Slot, msg: G::ServerMessage) {
        if self.senders[slot.index()].send(msg).is_err() {
            tracing::debug!(
                room_id = %self.room_id,
                %slot,
                "dropping message for closed connection"
            );
        }
    }
}

/// Spawns a room actor for a freshly matched pair and returns a handle.
///
/// `players[0]`/`senders[0]` belong to slot A (the earlier-queued
/// player), index 1 to slot B. Game state is created here and owned by
/// the actor task until the game finishes.
pub fn spawn_room<G: GameRules, S: ScoreStore>(
    config: &G::Config,
    players: [PlayerName; 2],
    senders: [PlayerSender<G>; 2],
    store: Arc<S>,
) -> RoomHandle<G> {
    let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

    let rules = G::start(config, players.clone());
    let actor = RoomActor {
        room_id,
        rules,
        players,
        senders,
        store,
        receiver: rx,
        timer_tx: tx.downgrade(),
        pending_timers: 0,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
