//! Concurrent card-matching memory race.
//!
//! Both players act on the same 20-card board at any time — there is no
//! turn order. Each player flips up to two cards; the second flip
//! schedules a deferred resolution for that player after a fixed delay,
//! during which the player's `checking` flag blocks further flips while
//! the opponent keeps playing unimpeded.
//!
//! Eligibility (already matched, checking, same card twice) is decided
//! when a flip arrives; the matched set is only written when the
//! resolution fires. Two players can therefore hold the same unmatched
//! index in flight and both be credited for it — the insert is
//! idempotent and the game still ends exactly once.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

use parlor_protocol::{
    Frame, PlayerName, ProtocolError, Recipient, Slot, Wire,
};
use parlor_room::{GameRules, MatchRecord, Step};

/// Conventional listen port for the memory game server.
pub const DEFAULT_PORT: u16 = 5555;

/// The ten card faces; each appears twice in the shuffled deck.
const FACE_VALUES: [&str; 10] = [
    "darkness",
    "double",
    "fairy",
    "fighting",
    "fire",
    "grass",
    "lightning",
    "metal",
    "psychic",
    "water",
];

/// Settings for the memory game.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// How long a second flip stays face-up before its pair resolves.
    pub resolve_delay: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            resolve_delay: Duration::from_secs(1),
        }
    }
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `CARD_CLICK:<index>:<value>` — a flip, value echoed by the client.
    Flip { index: usize, value: String },
    /// `CHAT:<text>` — broadcast verbatim, no state effect.
    Chat { text: String },
}

impl Wire for ClientMessage {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.command() {
            "CARD_CLICK" => Ok(ClientMessage::Flip {
                index: frame.parse_field(0)?,
                value: frame.field_at(1)?.to_string(),
            }),
            "CHAT" => Ok(ClientMessage::Chat {
                text: frame.fields().join(":"),
            }),
            _ => Err(frame.unknown()),
        }
    }

    fn encode(&self) -> Frame {
        match self {
            ClientMessage::Flip { index, value } => {
                Frame::new("CARD_CLICK").field(index).field(value)
            }
            ClientMessage::Chat { text } => Frame::new("CHAT").field(text),
        }
    }
}

/// Per-player verdict in the final `GAME_END` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Lose,
    Tie,
}

impl Verdict {
    fn as_str(self) -> &'static str {
        match self {
            Verdict::Win => "WIN",
            Verdict::Lose => "LOSE",
            Verdict::Tie => "TIE",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "WIN" => Some(Verdict::Win),
            "LOSE" => Some(Verdict::Lose),
            "TIE" => Some(Verdict::Tie),
            _ => None,
        }
    }
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// `GAME_START:<opponent>:<v,v,...>` — the shared card layout, the
    /// same copy to both players.
    Start {
        opponent: PlayerName,
        layout: Vec<String>,
    },
    /// `CARD_FLIPPED:<index>:<value>` — own accepted flip.
    Flipped { index: usize, value: String },
    /// `OPPONENT_CARD_FLIPPED:<index>:<value>`.
    OpponentFlipped { index: usize, value: String },
    /// `MATCH_SUCCESS:<first>:<second>`.
    MatchFound { first: usize, second: usize },
    /// `OPPONENT_MATCH:<first>:<second>`.
    OpponentMatch { first: usize, second: usize },
    /// `NO_MATCH:<first>:<second>` — clients re-hide these cards.
    NoMatch { first: usize, second: usize },
    /// `OPPONENT_NO_MATCH:<first>:<second>`.
    OpponentNoMatch { first: usize, second: usize },
    /// `SCORE:<own>:<opponent>` — each player sees their own score first.
    Score { own: u32, opponent: u32 },
    /// `CHAT:<name>: <text>`.
    Chat { line: String },
    /// `GAME_END:<verdict>:<own>:<opponent>:<seconds>`.
    GameEnd {
        verdict: Verdict,
        own: u32,
        opponent: u32,
        duration_secs: u64,
    },
    /// `OPPONENT_DISCONNECTED`.
    OpponentLeft,
}

impl Wire for ServerMessage {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let pair = || -> Result<(usize, usize), ProtocolError> {
            Ok((frame.parse_field(0)?, frame.parse_field(1)?))
        };
        match frame.command() {
            "GAME_START" => Ok(ServerMessage::Start {
                opponent: PlayerName::from(frame.field_at(0)?),
                layout: frame
                    .field_at(1)?
                    .split(',')
                    .map(str::to_string)
                    .collect(),
            }),
            "CARD_FLIPPED" => Ok(ServerMessage::Flipped {
                index: frame.parse_field(0)?,
                value: frame.field_at(1)?.to_string(),
            }),
            "OPPONENT_CARD_FLIPPED" => Ok(ServerMessage::OpponentFlipped {
                index: frame.parse_field(0)?,
                value: frame.field_at(1)?.to_string(),
            }),
            "MATCH_SUCCESS" => {
                let (first, second) = pair()?;
                Ok(ServerMessage::MatchFound { first, second })
            }
            "OPPONENT_MATCH" => {
                let (first, second) = pair()?;
                Ok(ServerMessage::OpponentMatch { first, second })
            }
            "NO_MATCH" => {
                let (first, second) = pair()?;
                Ok(ServerMessage::NoMatch { first, second })
            }
            "OPPONENT_NO_MATCH" => {
                let (first, second) = pair()?;
                Ok(ServerMessage::OpponentNoMatch { first, second })
            }
            "SCORE" => Ok(ServerMessage::Score {
                own: frame.parse_field(0)?,
                opponent: frame.parse_field(1)?,
            }),
            "CHAT" => Ok(ServerMessage::Chat {
                line: frame.fields().join(":"),
            }),
            "GAME_END" => {
                let raw = frame.field_at(0)?;
                let verdict = Verdict::from_str(raw).ok_or_else(|| {
                    ProtocolError::InvalidField {
                        command: frame.command().to_string(),
                        index: 0,
                        value: raw.to_string(),
                    }
                })?;
                Ok(ServerMessage::GameEnd {
                    verdict,
                    own: frame.parse_field(1)?,
                    opponent: frame.parse_field(2)?,
                    duration_secs: frame.parse_field(3)?,
                })
            }
            "OPPONENT_DISCONNECTED" => Ok(ServerMessage::OpponentLeft),
            _ => Err(frame.unknown()),
        }
    }

    fn encode(&self) -> Frame {
        match self {
            ServerMessage::Start { opponent, layout } => Frame::new(
                "GAME_START",
            )
            .field(opponent)
            .field(layout.join(",")),
            ServerMessage::Flipped { index, value } => {
                Frame::new("CARD_FLIPPED").field(index).field(value)
            }
            ServerMessage::OpponentFlipped { index, value } => {
                Frame::new("OPPONENT_CARD_FLIPPED").field(index).field(value)
            }
            ServerMessage::MatchFound { first, second } => {
                Frame::new("MATCH_SUCCESS").field(first).field(second)
            }
            ServerMessage::OpponentMatch { first, second } => {
                Frame::new("OPPONENT_MATCH").field(first).field(second)
            }
            ServerMessage::NoMatch { first, second } => {
                Frame::new("NO_MATCH").field(first).field(second)
            }
            ServerMessage::OpponentNoMatch { first, second } => {
                Frame::new("OPPONENT_NO_MATCH").field(first).field(second)
            }
            ServerMessage::Score { own, opponent } => {
                Frame::new("SCORE").field(own).field(opponent)
            }
            ServerMessage::Chat { line } => Frame::new("CHAT").field(line),
            ServerMessage::GameEnd {
                verdict,
                own,
                opponent,
                duration_secs,
            } => Frame::new("GAME_END")
                .field(verdict.as_str())
                .field(own)
                .field(opponent)
                .field(duration_secs),
            ServerMessage::OpponentLeft => {
                Frame::new("OPPONENT_DISCONNECTED")
            }
        }
    }
}

/// Deferred resolution payload: whose pending pair to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolve(pub Slot);

/// One player's in-flight pair.
#[derive(Debug, Default)]
struct Pending {
    first: Option<(usize, String)>,
    second: Option<(usize, String)>,
    /// Set between the second flip and its resolution; blocks new flips
    /// from this player only.
    checking: bool,
}

/// The authoritative game state for one memory room.
pub struct MemoryGame {
    players: [PlayerName; 2],
    /// Fixed at room creation; the same layout both clients render.
    deck: Vec<String>,
    /// Indices resolved as matched. Grows monotonically, each index
    /// written once.
    matched: HashSet<usize>,
    scores: [u32; 2],
    pending: [Pending; 2],
    resolve_delay: Duration,
    over: bool,
    started: Instant,
}

impl MemoryGame {
    /// The perspective score broadcast both players get after every
    /// change: own score first.
    fn with_scores(&self, step: Step<Self>) -> Step<Self> {
        step.send(
            Recipient::To(Slot::A),
            ServerMessage::Score {
                own: self.scores[0],
                opponent: self.scores[1],
            },
        )
        .send(
            Recipient::To(Slot::B),
            ServerMessage::Score {
                own: self.scores[1],
                opponent: self.scores[0],
            },
        )
    }

    /// Ends the game with per-player verdicts and match records.
    fn end_game(&mut self, mut step: Step<Self>) -> Step<Self> {
        if self.over {
            return step;
        }
        self.over = true;
        let duration_secs = self.started.elapsed().as_secs();

        for slot in [Slot::A, Slot::B] {
            let own = self.scores[slot.index()];
            let opponent = self.scores[slot.other().index()];
            let verdict = match own.cmp(&opponent) {
                std::cmp::Ordering::Greater => Verdict::Win,
                std::cmp::Ordering::Less => Verdict::Lose,
                std::cmp::Ordering::Equal => Verdict::Tie,
            };
            step = step
                .send(
                    Recipient::To(slot),
                    ServerMessage::GameEnd {
                        verdict,
                        own,
                        opponent,
                        duration_secs,
                    },
                )
                .persist(MatchRecord {
                    game: "MemoryGame".into(),
                    player: self.players[slot.index()].clone(),
                    score: own,
                    mode: "online".into(),
                    difficulty: "normal".into(),
                    duration_secs,
                    won: verdict == Verdict::Win,
                });
        }
        step
    }
}

impl GameRules for MemoryGame {
    type Config = MemoryConfig;
    type ClientMessage = ClientMessage;
    type ServerMessage = ServerMessage;
    type Timer = Resolve;

    fn start(config: &MemoryConfig, players: [PlayerName; 2]) -> Self {
        let mut deck: Vec<String> = FACE_VALUES
            .iter()
            .flat_map(|v| [v.to_string(), v.to_string()])
            .collect();
        deck.shuffle(&mut rand::rng());

        Self {
            players,
            deck,
            matched: HashSet::new(),
            scores: [0, 0],
            pending: [Pending::default(), Pending::default()],
            resolve_delay: config.resolve_delay,
            over: false,
            started: Instant::now(),
        }
    }

    fn on_start(&mut self) -> Step<Self> {
        let step = Step::none()
            .send(
                Recipient::To(Slot::A),
                ServerMessage::Start {
                    opponent: self.players[1].clone(),
                    layout: self.deck.clone(),
                },
            )
            .send(
                Recipient::To(Slot::B),
                ServerMessage::Start {
                    opponent: self.players[0].clone(),
                    layout: self.deck.clone(),
                },
            );
        self.with_scores(step)
    }

    fn on_message(
        &mut self,
        sender: Slot,
        msg: ClientMessage,
    ) -> Step<Self> {
        match msg {
            ClientMessage::Flip { index, value } => {
                if self.over
                    || index >= self.deck.len()
                    || self.matched.contains(&index)
                {
                    return Step::none();
                }
                let delay = self.resolve_delay;
                let pending = &mut self.pending[sender.index()];
                if pending.checking {
                    return Step::none();
                }

                let reveal = |step: Step<Self>| {
                    step.send(
                        Recipient::To(sender),
                        ServerMessage::Flipped {
                            index,
                            value: value.clone(),
                        },
                    )
                    .send(
                        Recipient::OpponentOf(sender),
                        ServerMessage::OpponentFlipped {
                            index,
                            value: value.clone(),
                        },
                    )
                };

                match pending.first {
                    None => {
                        pending.first = Some((index, value.clone()));
                        reveal(Step::none())
                    }
                    Some((first_index, _)) if first_index == index => {
                        // Same card twice is not a pair.
                        Step::none()
                    }
                    Some(_) => {
                        pending.second = Some((index, value.clone()));
                        pending.checking = true;
                        reveal(Step::none()).schedule(delay, Resolve(sender))
                    }
                }
            }
            ClientMessage::Chat { text } => {
                let line = format!(
                    "{}: {}",
                    self.players[sender.index()], text
                );
                Step::none().send(Recipient::Both, ServerMessage::Chat { line })
            }
        }
    }

    fn on_timer(&mut self, Resolve(slot): Resolve) -> Step<Self> {
        let pending = &mut self.pending[slot.index()];
        let taken = (pending.first.take(), pending.second.take());
        pending.checking = false;
        let (Some((first, first_value)), Some((second, second_value))) =
            taken
        else {
            return Step::none();
        };

        if first_value == second_value {
            self.matched.insert(first);
            self.matched.insert(second);
            self.scores[slot.index()] += 1;

            let mut step = Step::none()
                .send(
                    Recipient::To(slot),
                    ServerMessage::MatchFound { first, second },
                )
                .send(
                    Recipient::OpponentOf(slot),
                    ServerMessage::OpponentMatch { first, second },
                );
            step = self.with_scores(step);
            if self.matched.len() == self.deck.len() {
                step = self.end_game(step);
            }
            step
        } else {
            Step::none()
                .send(
                    Recipient::To(slot),
                    ServerMessage::NoMatch { first, second },
                )
                .send(
                    Recipient::OpponentOf(slot),
                    ServerMessage::OpponentNoMatch { first, second },
                )
        }
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
