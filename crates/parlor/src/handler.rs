//! Per-connection handler: handshake, matchmaking, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Read the first line → the player's identity → resolve display name
//!   2. Send `WAITING`, enqueue, and try to pair the two oldest waiters
//!   3. Once seated, loop: read lines → decode → forward to the room
//!
//! A separate writer task drains the room's outbound channel into the
//! socket, so a slow or dead peer never blocks the room actor.

use std::sync::Arc;

use parlor_protocol::{Frame, PlayerName, Slot, Wire};
use parlor_room::{
    GameRules, PlayerSender, RoomHandle, ScoreStore, spawn_room,
};
use parlor_transport::{Connection, TcpLineConnection};
use tokio::sync::{mpsc, oneshot};

use crate::ParlorError;
use crate::server::ServerState;
use crate::services::NameResolver;

/// A queued player awaiting an opponent.
pub(crate) struct Waiting<G: GameRules> {
    /// Resolved display name; becomes the slot's name at pairing.
    pub(crate) name: PlayerName,
    /// Outbound channel feeding this player's writer task.
    pub(crate) out: PlayerSender<G>,
    /// Delivers the seat once a room is spawned around this player.
    pub(crate) seat: oneshot::Sender<Seat<G>>,
}

/// A player's place in a freshly spawned room.
pub(crate) struct Seat<G: GameRules> {
    handle: RoomHandle<G>,
    slot: Slot,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, S, N>(
    conn: TcpLineConnection,
    state: Arc<ServerState<G, S, N>>,
) -> Result<(), ParlorError>
where
    G: GameRules,
    S: ScoreStore,
    N: NameResolver,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    // --- Step 1: handshake — the first non-blank line is the identity.
    let identity = loop {
        match conn.recv().await? {
            Some(line) if !line.trim().is_empty() => {
                break line.trim().to_string();
            }
            Some(_) => continue,
            None => {
                tracing::debug!(%conn_id, "closed before handshake");
                return Ok(());
            }
        }
    };
    let name = PlayerName(state.names.display_name(&identity).await);
    tracing::info!(%conn_id, player = %name, "player joined");

    // --- Step 2: outbound path. The room pushes typed messages; the
    // writer task renders and sends them in order.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<G::ServerMessage>();
    let writer_conn = Arc::clone(&conn);
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let line = msg.encode().to_string();
            if let Err(e) = writer_conn.send(&line).await {
                tracing::debug!(%conn_id, error = %e, "writer stopping");
                break;
            }
        }
    });

    conn.send("WAITING").await?;

    // --- Step 3: enqueue and attempt pairing. Whichever handler's
    // try_pair wins spawns the room and seats both players — possibly
    // neither seat is its own.
    let (seat_tx, mut seat_rx) = oneshot::channel();
    let ticket = state
        .queue
        .enqueue(Waiting {
            name: name.clone(),
            out: out_tx,
            seat: seat_tx,
        })
        .await;

    if let Some((a, b)) = state.queue.try_pair().await {
        let handle = spawn_room::<G, S>(
            &state.game_config,
            [a.name, b.name],
            [a.out, b.out],
            Arc::clone(&state.store),
        );
        let _ = a.seat.send(Seat {
            handle: handle.clone(),
            slot: Slot::A,
        });
        let _ = b.seat.send(Seat {
            handle,
            slot: Slot::B,
        });
    }

    // --- Step 4: wait to be seated. Lines sent while waiting carry no
    // meaning yet and are dropped; hanging up withdraws the queue entry.
    let seat = loop {
        tokio::select! {
            seat = &mut seat_rx => match seat {
                Ok(seat) => break seat,
                // Queue dropped out from under us — server going away.
                Err(_) => return Ok(()),
            },
            line = conn.recv() => match line {
                Ok(Some(line)) => {
                    tracing::debug!(
                        player = %name,
                        %line,
                        "ignoring message while waiting"
                    );
                }
                Ok(None) | Err(_) => {
                    if state.queue.remove(ticket).await.is_none() {
                        // Already paired: the seat is on its way. Tell
                        // the room this player is gone.
                        if let Ok(seat) = seat_rx.await {
                            let _ =
                                seat.handle.disconnect(seat.slot).await;
                        }
                    }
                    tracing::info!(player = %name, "left before pairing");
                    return Ok(());
                }
            }
        }
    };

    tracing::info!(
        player = %name,
        room_id = %seat.handle.room_id(),
        slot = %seat.slot,
        "seated"
    );

    // --- Step 5: read loop. Malformed lines are dropped, not fatal; a
    // closed room means the game is over and the player is just
    // lingering, so its messages are dropped too.
    loop {
        match conn.recv().await {
            Ok(Some(line)) => {
                let frame = match Frame::parse(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::debug!(
                            player = %name,
                            error = %e,
                            "dropping malformed line"
                        );
                        continue;
                    }
                };
                let msg = match G::ClientMessage::decode(&frame) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::debug!(
                            player = %name,
                            error = %e,
                            "dropping undecodable frame"
                        );
                        continue;
                    }
                };
                if seat.handle.message(seat.slot, msg).await.is_err() {
                    tracing::debug!(
                        player = %name,
                        "room closed, dropping message"
                    );
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(player = %name, error = %e, "recv error");
                break;
            }
        }
    }

    let _ = seat.handle.disconnect(seat.slot).await;
    tracing::info!(player = %name, "connection closed");
    Ok(())
}
