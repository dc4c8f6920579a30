//! The score persistence seam.
//!
//! Parlor doesn't persist scores itself — that's the deployment's job
//! (a database, an HTTP service, a flat file). The room layer defines the
//! [`ScoreStore`] trait and hands every finished match to it as a
//! [`MatchRecord`]; the server is constructed with a concrete store, so
//! tests substitute their own and nothing reaches for a global.

use std::future::Future;

use parlor_protocol::PlayerName;
use serde::{Deserialize, Serialize};

/// One player's result for one finished match.
///
/// Serde derives are for the store implementations: the field names below
/// are the stable shape a JSON-speaking backend receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Game identifier, e.g. `"TicTacToe"`, `"MemoryGame"`, `"Pacman"`.
    pub game: String,
    /// The player this record belongs to.
    pub player: PlayerName,
    /// The player's final score.
    pub score: u32,
    /// Play mode; networked matches record `"online"`.
    pub mode: String,
    /// Difficulty label carried through to the scoreboard.
    pub difficulty: String,
    /// Wall-clock match duration in whole seconds.
    pub duration_secs: u64,
    /// Whether this player won.
    pub won: bool,
}

/// Persists finished-match records.
///
/// Implementations may hit a network or database, so the method is async.
/// Returning `false` (or taking too long) never affects the game — the
/// room logs a warning and moves on.
pub trait ScoreStore: Send + Sync + 'static {
    /// Persists one record. Returns `true` on success.
    fn persist(
        &self,
        record: MatchRecord,
    ) -> impl Future<Output = bool> + Send;
}

/// A [`ScoreStore`] that accepts and discards every record.
///
/// The default wiring for servers that don't persist scores.
pub struct NullScoreStore;

impl ScoreStore for NullScoreStore {
    async fn persist(&self, record: MatchRecord) -> bool {
        tracing::debug!(
            game = %record.game,
            player = %record.player,
            score = record.score,
            won = record.won,
            "score discarded (no store configured)"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_record_json_shape() {
        // Store backends parse this shape; keep the field names stable.
        let record = MatchRecord {
            game: "MemoryGame".into(),
            player: PlayerName::from("alice"),
            score: 7,
            mode: "online".into(),
            difficulty: "normal".into(),
            duration_secs: 94,
            won: true,
        };
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(json["game"], "MemoryGame");
        assert_eq!(json["player"], "alice");
        assert_eq!(json["score"], 7);
        assert_eq!(json["mode"], "online");
        assert_eq!(json["difficulty"], "normal");
        assert_eq!(json["duration_secs"], 94);
        assert_eq!(json["won"], true);
    }

    #[test]
    fn match_record_round_trips() {
        let record = MatchRecord {
            game: "Pacman".into(),
            player: PlayerName::from("bob"),
            score: 230,
            mode: "online".into(),
            difficulty: "Normal".into(),
            duration_secs: 61,
            won: false,
        };
        let bytes = serde_json::to_vec(&record).unwrap();
        let decoded: MatchRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(record, decoded);
    }

    #[tokio::test]
    async fn null_store_accepts_everything() {
        let record = MatchRecord {
            game: "TicTacToe".into(),
            player: PlayerName::from("carol"),
            score: 1,
            mode: "online".into(),
            difficulty: "medium".into(),
            duration_secs: 30,
            won: true,
        };
        assert!(NullScoreStore.persist(record).await);
    }
}
