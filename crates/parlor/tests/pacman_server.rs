//! End-to-end tests for the maze race server — the real-time relay
//! variant with first-claim-wins scoring.

mod common;

use common::{TestClient, init_tracing};
use parlor::games::pacman::PacmanGame;
use parlor::{EchoNames, GameServerBuilder};
use parlor_room::NullScoreStore;

async fn start_server() -> std::net::SocketAddr {
    init_tracing();
    let server = GameServerBuilder::new()
        .bind("127.0.0.1:0")
        .build::<PacmanGame, _, _>((), NullScoreStore, EchoNames)
        .await
        .expect("server should bind");
    let addr = server.local_addr().expect("should have local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn seated_pair(
    addr: std::net::SocketAddr,
) -> (TestClient, TestClient) {
    let mut p1 = TestClient::join(addr, "p1").await;
    p1.expect("WAITING").await;
    let mut p2 = TestClient::join(addr, "p2").await;
    p2.expect("WAITING").await;

    p1.expect("START:1:p2").await;
    p2.expect("START:2:p1").await;
    (p1, p2)
}

#[tokio::test]
async fn players_are_numbered_in_queue_order() {
    let addr = start_server().await;
    let (_p1, _p2) = seated_pair(addr).await;
}

#[tokio::test]
async fn moves_relay_verbatim_with_no_validation() {
    let addr = start_server().await;
    let (mut p1, mut p2) = seated_pair(addr).await;

    p1.send("MOVE:5:7:1").await;
    p2.expect("OPPONENT_MOVE:5:7:1").await;

    // Physically implausible updates pass straight through.
    p2.send("MOVE:-40:999:3").await;
    p1.expect("OPPONENT_MOVE:-40:999:3").await;
}

#[tokio::test]
async fn a_dot_is_scored_exactly_once() {
    // Two claims for the same dot key: one increment total, the
    // repeat is a silent no-op.
    let addr = start_server().await;
    let (mut p1, mut p2) = seated_pair(addr).await;

    p1.send("DOT_COLLECTED:3:4").await;
    p1.expect("DOT_REMOVED:3:4").await;
    p1.expect("SCORE_UPDATE:10:0").await;
    p2.expect("DOT_REMOVED:3:4").await;
    p2.expect("SCORE_UPDATE:10:0").await;

    p2.send("DOT_COLLECTED:3:4").await;
    p2.expect_silence().await;
    p1.expect_silence().await;

    // A different dot still scores.
    p2.send("DOT_COLLECTED:3:5").await;
    p2.expect("DOT_REMOVED:3:5").await;
    p2.expect("SCORE_UPDATE:10:10").await;
}

#[tokio::test]
async fn ghost_hits_relay_the_victim_name() {
    let addr = start_server().await;
    let (mut p1, mut p2) = seated_pair(addr).await;

    p1.send("GHOST_HIT").await;
    p2.expect("OPPONENT_HIT:p1").await;
}

#[tokio::test]
async fn clearing_the_board_crowns_the_higher_score() {
    let addr = start_server().await;
    let (mut p1, mut p2) = seated_pair(addr).await;

    p1.send("DOT_COLLECTED:1:1").await;
    p1.expect("DOT_REMOVED:1:1").await;
    p1.expect("SCORE_UPDATE:10:0").await;
    p2.expect("DOT_REMOVED:1:1").await;
    p2.expect("SCORE_UPDATE:10:0").await;

    p2.send("GAME_OVER:all_dots").await;
    p1.expect("GAME_END:p1:10:0").await;
    p2.expect("GAME_END:p1:10:0").await;
}

#[tokio::test]
async fn running_out_of_lives_loses_regardless_of_score() {
    let addr = start_server().await;
    let (mut p1, mut p2) = seated_pair(addr).await;

    p1.send("DOT_COLLECTED:1:1").await;
    p1.expect("DOT_REMOVED:1:1").await;
    p1.expect("SCORE_UPDATE:10:0").await;
    p2.expect("DOT_REMOVED:1:1").await;
    p2.expect("SCORE_UPDATE:10:0").await;

    p1.send("GAME_OVER:no_lives").await;
    p1.expect("GAME_END:p2:10:0").await;
    p2.expect("GAME_END:p2:10:0").await;

    // The room is done; later events fall on the floor.
    p2.send("DOT_COLLECTED:8:8").await;
    p2.expect_silence().await;
}

#[tokio::test]
async fn equal_scores_on_a_cleared_board_tie() {
    let addr = start_server().await;
    let (mut p1, mut p2) = seated_pair(addr).await;

    p1.send("GAME_OVER:all_dots").await;
    p1.expect("GAME_END:TIE:0:0").await;
    p2.expect("GAME_END:TIE:0:0").await;
}

#[tokio::test]
async fn unroutable_lines_are_silently_ignored() {
    let addr = start_server().await;
    let (mut p1, mut p2) = seated_pair(addr).await;

    p1.send("TELEPORT:0:0").await;
    p1.send("GAME_OVER:sneeze").await;
    p1.send("MOVE:abc:0:0").await;
    p1.expect_silence().await;

    p1.send("MOVE:2:2:0").await;
    p2.expect("OPPONENT_MOVE:2:2:0").await;
}

#[tokio::test]
async fn disconnect_notifies_the_survivor() {
    let addr = start_server().await;
    let (p1, mut p2) = seated_pair(addr).await;

    drop(p1);
    p2.expect("OPPONENT_DISCONNECTED").await;
}
