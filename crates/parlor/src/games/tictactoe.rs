//! Turn-based tic-tac-toe.
//!
//! Slot A is always `X` and moves first; the turn flips only on an
//! accepted move. The server is authoritative: a move out of turn, with
//! the wrong symbol, or into an occupied cell is answered with an
//! `ERROR` reason and changes nothing.

use std::convert::Infallible;
use std::time::Instant;

use parlor_protocol::{
    Frame, PlayerName, ProtocolError, Recipient, Slot, Wire,
};
use parlor_room::{GameRules, MatchRecord, Step};

/// Conventional listen port for the tic-tac-toe server.
pub const DEFAULT_PORT: u16 = 5557;

/// One board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    /// The wire symbol for a mark. Empty cells never reach the wire.
    fn symbol(self) -> &'static str {
        match self {
            Cell::Empty => "",
            Cell::X => "X",
            Cell::O => "O",
        }
    }
}

/// The mark a slot plays: A is X, B is O, for the life of the room.
fn mark_of(slot: Slot) -> Cell {
    match slot {
        Slot::A => Cell::X,
        Slot::B => Cell::O,
    }
}

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    NotYourTurn,
    WrongSymbol,
    CellOccupied,
}

impl Reject {
    fn reason(self) -> &'static str {
        match self {
            Reject::NotYourTurn => "not-your-turn",
            Reject::WrongSymbol => "wrong-symbol",
            Reject::CellOccupied => "cell-occupied",
        }
    }

    fn from_reason(reason: &str) -> Option<Self> {
        match reason {
            "not-your-turn" => Some(Reject::NotYourTurn),
            "wrong-symbol" => Some(Reject::WrongSymbol),
            "cell-occupied" => Some(Reject::CellOccupied),
            _ => None,
        }
    }
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `MOVE:<row>:<col>:<symbol>`. The symbol is echoed by the client
    /// and validated against the sender's assigned mark.
    Move {
        row: usize,
        col: usize,
        symbol: String,
    },
}

impl Wire for ClientMessage {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.command() {
            "MOVE" => {
                let row: usize = frame.parse_field(0)?;
                let col: usize = frame.parse_field(1)?;
                for (index, coord) in [(0, row), (1, col)] {
                    if coord > 2 {
                        return Err(ProtocolError::InvalidField {
                            command: frame.command().to_string(),
                            index,
                            value: coord.to_string(),
                        });
                    }
                }
                Ok(ClientMessage::Move {
                    row,
                    col,
                    symbol: frame.field_at(2)?.to_string(),
                })
            }
            _ => Err(frame.unknown()),
        }
    }

    fn encode(&self) -> Frame {
        match self {
            ClientMessage::Move { row, col, symbol } => {
                Frame::new("MOVE").field(row).field(col).field(symbol)
            }
        }
    }
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// `SYMBOL:<mark>:<opponent>` — opening assignment.
    Assigned {
        symbol: String,
        opponent: PlayerName,
    },
    /// `MOVE:<row>:<col>:<symbol>` — an accepted move, relayed to the
    /// opponent.
    Moved {
        row: usize,
        col: usize,
        symbol: String,
    },
    /// `ERROR:<reason>` — the offending sender only.
    Rejected(Reject),
    /// `WIN:<winner>` — broadcast, ends the game.
    Won { winner: PlayerName },
    /// `DRAW` — broadcast, ends the game.
    Drawn,
    /// `OPPONENT_DISCONNECTED`.
    OpponentLeft,
}

impl Wire for ServerMessage {
    fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        match frame.command() {
            "SYMBOL" => Ok(ServerMessage::Assigned {
                symbol: frame.field_at(0)?.to_string(),
                opponent: PlayerName::from(frame.field_at(1)?),
            }),
            "MOVE" => Ok(ServerMessage::Moved {
                row: frame.parse_field(0)?,
                col: frame.parse_field(1)?,
                symbol: frame.field_at(2)?.to_string(),
            }),
            "ERROR" => {
                let reason = frame.field_at(0)?;
                Reject::from_reason(reason).map(ServerMessage::Rejected).ok_or_else(
                    || ProtocolError::InvalidField {
                        command: frame.command().to_string(),
                        index: 0,
                        value: reason.to_string(),
                    },
                )
            }
            "WIN" => Ok(ServerMessage::Won {
                winner: PlayerName::from(frame.field_at(0)?),
            }),
            "DRAW" => Ok(ServerMessage::Drawn),
            "OPPONENT_DISCONNECTED" => Ok(ServerMessage::OpponentLeft),
            _ => Err(frame.unknown()),
        }
    }

    fn encode(&self) -> Frame {
        match self {
            ServerMessage::Assigned { symbol, opponent } => {
                Frame::new("SYMBOL").field(symbol).field(opponent)
            }
            ServerMessage::Moved { row, col, symbol } => {
                Frame::new("MOVE").field(row).field(col).field(symbol)
            }
            ServerMessage::Rejected(reject) => {
                Frame::new("ERROR").field(reject.reason())
            }
            ServerMessage::Won { winner } => Frame::new("WIN").field(winner),
            ServerMessage::Drawn => Frame::new("DRAW"),
            ServerMessage::OpponentLeft => {
                Frame::new("OPPONENT_DISCONNECTED")
            }
        }
    }
}

/// The authoritative game state for one tic-tac-toe room.
pub struct TicTacToe {
    players: [PlayerName; 2],
    board: [[Cell; 3]; 3],
    turn: Slot,
    over: bool,
    started: Instant,
}

impl TicTacToe {
    fn reject(sender: Slot, why: Reject) -> Step<Self> {
        Step::none().send(Recipient::To(sender), ServerMessage::Rejected(why))
    }

    /// One record per player for a decided game (`winner` is `None` for
    /// a draw).
    fn records(&self, winner: Option<Slot>) -> Vec<MatchRecord> {
        let duration_secs = self.started.elapsed().as_secs();
        [Slot::A, Slot::B]
            .into_iter()
            .map(|slot| {
                let won = winner == Some(slot);
                MatchRecord {
                    game: "TicTacToe".into(),
                    player: self.players[slot.index()].clone(),
                    score: u32::from(won),
                    mode: "online".into(),
                    difficulty: "medium".into(),
                    duration_secs,
                    won,
                }
            })
            .collect()
    }
}

impl GameRules for TicTacToe {
    type Config = ();
    type ClientMessage = ClientMessage;
    type ServerMessage = ServerMessage;
    type Timer = Infallible;

    fn start(_config: &(), players: [PlayerName; 2]) -> Self {
        Self {
            players,
            board: [[Cell::Empty; 3]; 3],
            turn: Slot::A,
            over: false,
            started: Instant::now(),
        }
    }

    fn on_start(&mut self) -> Step<Self> {
        Step::none()
            .send(
                Recipient::To(Slot::A),
                ServerMessage::Assigned {
                    symbol: "X".into(),
                    opponent: self.players[1].clone(),
                },
            )
            .send(
                Recipient::To(Slot::B),
                ServerMessage::Assigned {
                    symbol: "O".into(),
                    opponent: self.players[0].clone(),
                },
            )
    }

    fn on_message(
        &mut self,
        sender: Slot,
        msg: ClientMessage,
    ) -> Step<Self> {
        let ClientMessage::Move { row, col, symbol } = msg;
        if self.over {
            return Step::none();
        }
        if sender != self.turn {
            return Self::reject(sender, Reject::NotYourTurn);
        }
        let mark = mark_of(sender);
        if symbol != mark.symbol() {
            return Self::reject(sender, Reject::WrongSymbol);
        }
        if self.board[row][col] != Cell::Empty {
            return Self::reject(sender, Reject::CellOccupied);
        }

        self.board[row][col] = mark;
        self.turn = self.turn.other();

        let mut step = Step::none().send(
            Recipient::OpponentOf(sender),
            ServerMessage::Moved { row, col, symbol },
        );

        if check_winner(&self.board, mark) {
            self.over = true;
            step = step.send(
                Recipient::Both,
                ServerMessage::Won {
                    winner: self.players[sender.index()].clone(),
                },
            );
            for record in self.records(Some(sender)) {
                step = step.persist(record);
            }
        } else if board_full(&self.board) {
            self.over = true;
            step = step.send(Recipient::Both, ServerMessage::Drawn);
            for record in self.records(None) {
                step = step.persist(record);
            }
        }
        step
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

fn check_winner(b: &[[Cell; 3]; 3], m: Cell) -> bool {
    (0..3).any(|i| (0..3).all(|j| b[i][j] == m))        // rows
        || (0..3).any(|j| (0..3).all(|i| b[i][j] == m)) // cols
        || (0..3).all(|i| b[i][i] == m)                 // diagonal
        || (0..3).all(|i| b[i][2 - i] == m)             // anti-diagonal
}

fn board_full(b: &[[Cell; 3]; 3]) -> bool {
    b.iter().all(|row| row.iter().all(|c| *c != Cell::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> TicTacToe {
        TicTacToe::start(
            &(),
            [PlayerName::from("alice"), PlayerName::from("bob")],
        )
    }

    fn mv(row: usize, col: usize, symbol: &str) -> ClientMessage {
        ClientMessage::Move {
            row,
            col,
            symbol: symbol.into(),
        }
    }

    /// Collects just the messages of a step, recipients included.
    fn messages(step: Step<TicTacToe>) -> Vec<(Recipient, ServerMessage)> {
        step.messages
    }

    #[test]
    fn slot_a_is_x_and_moves_first() {
        let mut g = game();
        let opening = messages(g.on_start());
        assert_eq!(
            opening[0],
            (
                Recipient::To(Slot::A),
                ServerMessage::Assigned {
                    symbol: "X".into(),
                    opponent: PlayerName::from("bob"),
                }
            )
        );
        assert_eq!(g.turn, Slot::A);
    }

    #[test]
    fn move_out_of_turn_is_rejected_without_state_change() {
        let mut g = game();
        let step = g.on_message(Slot::B, mv(0, 0, "O"));
        assert_eq!(
            messages(step),
            vec![(
                Recipient::To(Slot::B),
                ServerMessage::Rejected(Reject::NotYourTurn)
            )]
        );
        assert_eq!(g.board[0][0], Cell::Empty);
        assert_eq!(g.turn, Slot::A);
    }

    #[test]
    fn wrong_symbol_is_rejected() {
        let mut g = game();
        let step = g.on_message(Slot::A, mv(0, 0, "O"));
        assert_eq!(
            messages(step),
            vec![(
                Recipient::To(Slot::A),
                ServerMessage::Rejected(Reject::WrongSymbol)
            )]
        );
        assert_eq!(g.turn, Slot::A);
    }

    #[test]
    fn occupied_cell_is_rejected_and_turn_returns_to_mover() {
        // A plays (0,0); B plays (0,0) → cell-occupied; B then plays
        // (1,1) → accepted, turn back to A.
        let mut g = game();
        g.on_message(Slot::A, mv(0, 0, "X"));

        let step = g.on_message(Slot::B, mv(0, 0, "O"));
        assert_eq!(
            messages(step),
            vec![(
                Recipient::To(Slot::B),
                ServerMessage::Rejected(Reject::CellOccupied)
            )]
        );
        assert_eq!(g.board[0][0], Cell::X);

        let step = g.on_message(Slot::B, mv(1, 1, "O"));
        assert_eq!(
            messages(step),
            vec![(
                Recipient::OpponentOf(Slot::B),
                ServerMessage::Moved {
                    row: 1,
                    col: 1,
                    symbol: "O".into()
                }
            )]
        );
        assert_eq!(g.turn, Slot::A);
    }

    #[test]
    fn turn_alternates_only_on_accepted_moves() {
        let mut g = game();
        assert_eq!(g.turn, Slot::A);
        g.on_message(Slot::A, mv(0, 0, "X"));
        assert_eq!(g.turn, Slot::B);
        g.on_message(Slot::B, mv(0, 0, "O")); // rejected
        assert_eq!(g.turn, Slot::B);
        g.on_message(Slot::B, mv(2, 2, "O"));
        assert_eq!(g.turn, Slot::A);
    }

    #[test]
    fn top_row_win_broadcasts_winner_and_finishes() {
        let mut g = game();
        g.on_message(Slot::A, mv(0, 0, "X"));
        g.on_message(Slot::B, mv(1, 0, "O"));
        g.on_message(Slot::A, mv(0, 1, "X"));
        g.on_message(Slot::B, mv(1, 1, "O"));

        let step = g.on_message(Slot::A, mv(0, 2, "X"));
        let msgs = messages(step);
        assert!(msgs.contains(&(
            Recipient::Both,
            ServerMessage::Won {
                winner: PlayerName::from("alice")
            }
        )));
        assert!(g.is_finished());

        // Further moves are dead.
        let step = g.on_message(Slot::B, mv(2, 2, "O"));
        assert!(step.messages.is_empty());
        assert_eq!(g.board[2][2], Cell::Empty);
    }

    #[test]
    fn win_detection_covers_all_eight_lines() {
        // Rows
        for row in 0..3 {
            let mut b = [[Cell::Empty; 3]; 3];
            for col in 0..3 {
                b[row][col] = Cell::X;
            }
            assert!(check_winner(&b, Cell::X), "row {row}");
        }
        // Columns
        for col in 0..3 {
            let mut b = [[Cell::Empty; 3]; 3];
            for row in 0..3 {
                b[row][col] = Cell::O;
            }
            assert!(check_winner(&b, Cell::O), "col {col}");
        }
        // Diagonals
        let mut b = [[Cell::Empty; 3]; 3];
        for i in 0..3 {
            b[i][i] = Cell::X;
        }
        assert!(check_winner(&b, Cell::X), "main diagonal");

        let mut b = [[Cell::Empty; 3]; 3];
        for i in 0..3 {
            b[i][2 - i] = Cell::O;
        }
        assert!(check_winner(&b, Cell::O), "anti-diagonal");
    }

    #[test]
    fn full_board_without_a_line_is_a_draw() {
        //  X | O | X
        //  X | O | X
        //  O | X | O
        let mut g = game();
        g.on_message(Slot::A, mv(0, 0, "X"));
        g.on_message(Slot::B, mv(0, 1, "O"));
        g.on_message(Slot::A, mv(0, 2, "X"));
        g.on_message(Slot::B, mv(1, 1, "O"));
        g.on_message(Slot::A, mv(1, 0, "X"));
        g.on_message(Slot::B, mv(2, 0, "O"));
        g.on_message(Slot::A, mv(1, 2, "X"));
        g.on_message(Slot::B, mv(2, 2, "O"));

        let step = g.on_message(Slot::A, mv(2, 1, "X"));
        let msgs = messages(step);
        assert!(msgs.contains(&(Recipient::Both, ServerMessage::Drawn)));
        assert!(g.is_finished());
    }

    #[test]
    fn win_emits_one_record_per_player() {
        let mut g = game();
        g.on_message(Slot::A, mv(0, 0, "X"));
        g.on_message(Slot::B, mv(1, 0, "O"));
        g.on_message(Slot::A, mv(0, 1, "X"));
        g.on_message(Slot::B, mv(1, 1, "O"));
        let step = g.on_message(Slot::A, mv(0, 2, "X"));

        assert_eq!(step.records.len(), 2);
        let winner = &step.records[0];
        assert_eq!(winner.game, "TicTacToe");
        assert_eq!(winner.player, PlayerName::from("alice"));
        assert!(winner.won);
        assert_eq!(winner.score, 1);
        assert!(!step.records[1].won);
    }

    #[test]
    fn disconnect_notifies_survivor_once() {
        let mut g = game();
        let step = g.on_disconnect(Slot::A);
        assert_eq!(
            messages(step),
            vec![(
                Recipient::OpponentOf(Slot::A),
                ServerMessage::OpponentLeft
            )]
        );
        assert!(g.is_finished());
        assert!(g.on_disconnect(Slot::B).messages.is_empty());
    }

    #[test]
    fn wire_round_trips() {
        let msgs = [
            ServerMessage::Assigned {
                symbol: "X".into(),
                opponent: PlayerName::from("bob"),
            },
            ServerMessage::Moved {
                row: 2,
                col: 0,
                symbol: "O".into(),
            },
            ServerMessage::Rejected(Reject::CellOccupied),
            ServerMessage::Won {
                winner: PlayerName::from("alice"),
            },
            ServerMessage::Drawn,
            ServerMessage::OpponentLeft,
        ];
        for msg in msgs {
            let line = msg.encode().to_string();
            let frame = Frame::parse(&line).unwrap();
            assert_eq!(ServerMessage::decode(&frame).unwrap(), msg);
        }
    }

    #[test]
    fn decode_rejects_out_of_range_coordinates() {
        let frame = Frame::parse("MOVE:3:0:X").unwrap();
        assert!(ClientMessage::decode(&frame).is_err());
        let frame = Frame::parse("MOVE:0:9:X").unwrap();
        assert!(ClientMessage::decode(&frame).is_err());
    }
}
