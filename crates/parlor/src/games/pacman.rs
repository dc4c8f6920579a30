//! Pacman-style maze race: a real-time position/event relay.
//!
//! No turn order and no movement validation — each player's position
//! updates are relayed verbatim to the opponent (trust the sender for
//! state, not for scoring). Scoring is contested through the shared dot
//! set with first-claim-wins semantics, so the same dot can never be
//! counted twice no matter how the two clients race.

use std::collections::HashSet;
use std::convert::Infallible;
use std::time::Instant;

use parlor_protocol::{
    Frame, PlayerName, ProtocolError, Recipient, Slot, Wire,
};
use parlor_room::{GameRules, MatchRecord, Step};

/// Conventional listen port for the maze race server.
pub const DEFAULT_PORT: u16 = 5558;

/// Points per collected dot.
const DOT_POINTS: u32 = 10;

/// Why a client reports its game as over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The board is cleared: the higher score wins.
    AllDots,
    /// The reporter ran out of lives: the opponent wins.
    NoLives,
}

impl EndReason {
    fn as_str(self) -> &'static str {
        match self {
            EndReason::AllDots => "all_dots",
            EndReason::NoLives => "no_lives",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "all_dots" => Some(EndReason::AllDots),
            "no_lives" => Some(EndReason::NoLives),
            _ => None,
        }
    }
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `MOVE:<x>:<y>:<direction>` — opaque position update.
    Move { x: i32, y: i32, direction: i32 },
    /// `DOT_COLLECTED:<x>:<y>` — a claim on the dot at that coordinate.
    DotCollected { x: i32, y: i32 },
    /// `GHOST_HIT` — the sender was hit; relayed for display only.
    GhostHit,
    /// `GAME_OVER:<reason>` — terminal report from either side.
    GameOver { reason: EndReason },
}

impl Wire for ClientMessage {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.command() {
            "MOVE" => Ok(ClientMessage::Move {
                x: frame.parse_field(0)?,
                y: frame.parse_field(1)?,
                direction: frame.parse_field(2)?,
            }),
            "DOT_COLLECTED" => Ok(ClientMessage::DotCollected {
                x: frame.parse_field(0)?,
                y: frame.parse_field(1)?,
            }),
            "GHOST_HIT" => Ok(ClientMessage::GhostHit),
            "GAME_OVER" => {
                let raw = frame.field_at(0)?;
                let reason = EndReason::from_str(raw).ok_or_else(|| {
                    ProtocolError::InvalidField {
                        command: frame.command().to_string(),
                        index: 0,
                        value: raw.to_string(),
                    }
                })?;
                Ok(ClientMessage::GameOver { reason })
            }
            _ => Err(frame.unknown()),
        }
    }

    fn encode(&self) -> Frame {
        match self {
            ClientMessage::Move { x, y, direction } => {
                Frame::new("MOVE").field(x).field(y).field(direction)
            }
            ClientMessage::DotCollected { x, y } => {
                Frame::new("DOT_COLLECTED").field(x).field(y)
            }
            ClientMessage::GhostHit => Frame::new("GHOST_HIT"),
            ClientMessage::GameOver { reason } => {
                Frame::new("GAME_OVER").field(reason.as_str())
            }
        }
    }
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// `START:<number>:<opponent>` — player number assignment.
    Start { number: u8, opponent: PlayerName },
    /// `OPPONENT_MOVE:<x>:<y>:<direction>`.
    OpponentMoved { x: i32, y: i32, direction: i32 },
    /// `DOT_REMOVED:<x>:<y>` — broadcast after a winning claim.
    DotRemoved { x: i32, y: i32 },
    /// `SCORE_UPDATE:<score1>:<score2>` — absolute scores, slot A first,
    /// the same copy to both players.
    ScoreUpdate { score1: u32, score2: u32 },
    /// `OPPONENT_HIT:<name>`.
    OpponentHit { name: PlayerName },
    /// `GAME_END:<winner|TIE>:<score1>:<score2>` — broadcast.
    GameEnd {
        winner: Option<PlayerName>,
        score1: u32,
        score2: u32,
    },
    /// `OPPONENT_DISCONNECTED`.
    OpponentLeft,
}

impl Wire for ServerMessage {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.command() {
            "START" => Ok(ServerMessage::Start {
                number: frame.parse_field(0)?,
                opponent: PlayerName::from(frame.field_at(1)?),
            }),
            "OPPONENT_MOVE" => Ok(ServerMessage::OpponentMoved {
                x: frame.parse_field(0)?,
                y: frame.parse_field(1)?,
                direction: frame.parse_field(2)?,
            }),
            "DOT_REMOVED" => Ok(ServerMessage::DotRemoved {
                x: frame.parse_field(0)?,
                y: frame.parse_field(1)?,
            }),
            "SCORE_UPDATE" => Ok(ServerMessage::ScoreUpdate {
                score1: frame.parse_field(0)?,
                score2: frame.parse_field(1)?,
            }),
            "OPPONENT_HIT" => Ok(ServerMessage::OpponentHit {
                name: PlayerName::from(frame.field_at(0)?),
            }),
            "GAME_END" => {
                let raw = frame.field_at(0)?;
                let winner = if raw == "TIE" {
                    None
                } else {
                    Some(PlayerName::from(raw))
                };
                Ok(ServerMessage::GameEnd {
                    winner,
                    score1: frame.parse_field(1)?,
                    score2: frame.parse_field(2)?,
                })
            }
            "OPPONENT_DISCONNECTED" => Ok(ServerMessage::OpponentLeft),
            _ => Err(frame.unknown()),
        }
    }

    fn encode(&self) -> Frame {
        match self {
            ServerMessage::Start { number, opponent } => {
                Frame::new("START").field(number).field(opponent)
            }
            ServerMessage::OpponentMoved { x, y, direction } => {
                Frame::new("OPPONENT_MOVE").field(x).field(y).field(direction)
            }
            ServerMessage::DotRemoved { x, y } => {
                Frame::new("DOT_REMOVED").field(x).field(y)
            }
            ServerMessage::ScoreUpdate { score1, score2 } => {
                Frame::new("SCORE_UPDATE").field(score1).field(score2)
            }
            ServerMessage::OpponentHit { name } => {
                Frame::new("OPPONENT_HIT").field(name)
            }
            ServerMessage::GameEnd {
                winner,
                score1,
                score2,
            } => Frame::new("GAME_END")
                .field(match winner {
                    Some(name) => name.as_str(),
                    None => "TIE",
                })
                .field(score1)
                .field(score2),
            ServerMessage::OpponentLeft => {
                Frame::new("OPPONENT_DISCONNECTED")
            }
        }
    }
}

/// One player's last reported position. Opaque to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    x: i32,
    y: i32,
    direction: i32,
}

/// Spawn points, slot A then slot B (opposite maze corners).
const SPAWNS: [Position; 2] = [
    Position {
        x: 1,
        y: 1,
        direction: 0,
    },
    Position {
        x: 22,
        y: 18,
        direction: 2,
    },
];

/// The authoritative state for one maze race room.
pub struct PacmanGame {
    players: [PlayerName; 2],
    positions: [Position; 2],
    /// Claimed dot coordinates (`"x,y"`), first claim wins.
    claimed: HashSet<String>,
    scores: [u32; 2],
    over: bool,
    started: Instant,
}

impl PacmanGame {
    /// Ends the game: broadcast the verdict and emit records.
    fn end_game(&mut self, winner: Option<Slot>) -> Step<Self> {
        self.over = true;
        let duration_secs = self.started.elapsed().as_secs();

        let mut step = Step::none().send(
            Recipient::Both,
            ServerMessage::GameEnd {
                winner: winner
                    .map(|slot| self.players[slot.index()].clone()),
                score1: self.scores[0],
                score2: self.scores[1],
            },
        );
        for slot in [Slot::A, Slot::B] {
            let won = winner == Some(slot);
            step = step.persist(MatchRecord {
                game: "Pacman".into(),
                player: self.players[slot.index()].clone(),
                score: self.scores[slot.index()],
                mode: "online".into(),
                difficulty: "Normal".into(),
                duration_secs,
                won,
            });
        }
        step
    }
}

impl GameRules for PacmanGame {
    type Config = ();
    type ClientMessage = ClientMessage;
    type ServerMessage = ServerMessage;
    type Timer = Infallible;

    fn start(_config: &(), players: [PlayerName; 2]) -> Self {
        Self {
            players,
            positions: SPAWNS,
            claimed: HashSet::new(),
            scores: [0, 0],
            over: false,
            started: Instant::now(),
        }
    }

    fn on_start(&mut self) -> Step<Self> {
        Step::none()
            .send(
                Recipient::To(Slot::A),
                ServerMessage::Start {
                    number: 1,
                    opponent: self.players[1].clone(),
                },
            )
            .send(
                Recipient::To(Slot::B),
                ServerMessage::Start {
                    number: 2,
                    opponent: self.players[0].clone(),
                },
            )
    }

    fn on_message(
        &mut self,
        sender: Slot,
        msg: ClientMessage,
    ) -> Step<Self> {
        if self.over {
            return Step::none();
        }
        match msg {
            ClientMessage::Move { x, y, direction } => {
                self.positions[sender.index()] = Position { x, y, direction };
                Step::none().send(
                    Recipient::OpponentOf(sender),
                    ServerMessage::OpponentMoved { x, y, direction },
                )
            }
            ClientMessage::DotCollected { x, y } => {
                let key = format!("{x},{y}");
                if !self.claimed.insert(key) {
                    // Lost the race for this dot; silent no-op.
                    return Step::none();
                }
                self.scores[sender.index()] += DOT_POINTS;
                Step::none()
                    .send(
                        Recipient::Both,
                        ServerMessage::DotRemoved { x, y },
                    )
                    .send(
                        Recipient::Both,
                        ServerMessage::ScoreUpdate {
                            score1: self.scores[0],
                            score2: self.scores[1],
                        },
                    )
            }
            ClientMessage::GhostHit => Step::none().send(
                Recipient::OpponentOf(sender),
                ServerMessage::OpponentHit {
                    name: self.players[sender.index()].clone(),
                },
            ),
            ClientMessage::GameOver { reason } => {
                let winner = match reason {
                    EndReason::AllDots => {
                        match self.scores[0].cmp(&self.scores[1]) {
                            std::cmp::Ordering::Greater => Some(Slot::A),
                            std::cmp::Ordering::Less => Some(Slot::B),
                            std::cmp::Ordering::Equal => None,
                        }
                    }
                    // Eliminated reporter loses; the survivor wins.
                    EndReason::NoLives => Some(sender.other()),
                };
                self.end_game(winner)
            }
        }
    }

    fn on_timer(&mut self, timer: Infallible) -> Step<Self> {
        match timer {}
    }

    fn on_disconnect(&mut self, slot: Slot) -> Step<Self> {
        if self.over {
            return Step::none();
        }
        self.over = true;
        Step::none().send(
            Recipient::OpponentOf(slot),
            ServerMessage::OpponentLeft,
        )
    }

    fn is_finished(&self) -> bool {
        self.over
    }
}
