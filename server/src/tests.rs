use crate::api::{self, LeaderboardParams};
use crate::config::ServerConfig;
use crate::error::LobbyError;
use crate::lobby::Lobby;
use crate::registry::ConnId;
use crate::{app, AppState};
use rps_protocol::*;
use tokio::sync::mpsc;
use uuid::Uuid;

#[cfg(test)]
mod lobby_tests {
    use super::*;

    /// A fake client: its id plus the receiving end of its outbox.
    struct Player {
        id: ConnId,
        tx: mpsc::UnboundedSender<ServerToClient>,
        rx: mpsc::UnboundedReceiver<ServerToClient>,
    }

    impl Player {
        fn new() -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            Player {
                id: Uuid::new_v4(),
                tx,
                rx,
            }
        }

        fn inbox(&mut self) -> Vec<ServerToClient> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                out.push(msg);
            }
            out
        }
    }

    fn join(lobby: &mut Lobby, p: &Player, name: &str, code: &str, country: &str) {
        lobby
            .handle(
                p.id,
                ClientToServer::Join {
                    name: name.to_string(),
                    country: Some(country.to_string()),
                    country_code: Some(code.to_string()),
                    flag: None,
                },
                &p.tx,
            )
            .expect("join accepted");
    }

    fn choose(lobby: &mut Lobby, p: &Player, choice: Choice) {
        lobby
            .handle(p.id, ClientToServer::Choose { choice }, &p.tx)
            .expect("choice accepted");
    }

    fn round_results(msgs: &[ServerToClient]) -> Vec<RoundSummary> {
        msgs.iter()
            .filter_map(|m| match m {
                ServerToClient::RoundResult { round, .. } => Some(round.clone()),
                _ => None,
            })
            .collect()
    }

    fn tally(lobby: &Lobby, code: &str) -> (u64, u64, u64) {
        let e = lobby.country_stats(code);
        (e.wins, e.losses, e.draws)
    }

    /// Alice and Bob seated together with their inboxes drained.
    fn seated_pair() -> (Lobby, Player, Player) {
        let mut lobby = Lobby::new();
        let mut alice = Player::new();
        let mut bob = Player::new();
        join(&mut lobby, &alice, "Alice", "TH", "Thailand");
        join(&mut lobby, &bob, "Bob", "US", "United States");
        alice.inbox();
        bob.inbox();
        (lobby, alice, bob)
    }

    #[test]
    fn pairing_announces_each_opponent() {
        let mut lobby = Lobby::new();
        let mut alice = Player::new();
        let mut bob = Player::new();

        join(&mut lobby, &alice, "Alice", "TH", "Thailand");
        let first = alice.inbox();
        assert_eq!(first.len(), 1);
        let ServerToClient::RoomAssigned { room_id } = &first[0] else {
            panic!("expected RoomAssigned, got {:?}", first);
        };

        join(&mut lobby, &bob, "Bob", "US", "United States");
        let bob_msgs = bob.inbox();
        assert!(matches!(
            &bob_msgs[0],
            ServerToClient::RoomAssigned { room_id: r } if r == room_id
        ));
        match &bob_msgs[1] {
            ServerToClient::RoomReady { you, opponent, .. } => {
                assert_eq!(you.name, "Bob");
                assert_eq!(opponent.name, "Alice");
                assert_eq!(opponent.country.country_code, "TH");
            }
            other => panic!("expected RoomReady, got {:?}", other),
        }

        match alice.inbox().as_slice() {
            [ServerToClient::RoomReady { opponent, .. }] => assert_eq!(opponent.id, bob.id),
            other => panic!("expected RoomReady, got {:?}", other),
        }
        assert_eq!(lobby.room_count(), 1);
        assert_eq!(lobby.playing_count(), 2);
    }

    #[test]
    fn full_rounds_update_leaderboard() {
        let (mut lobby, mut alice, mut bob) = seated_pair();

        choose(&mut lobby, &alice, Choice::Rock);
        assert!(alice.inbox().is_empty());
        assert!(matches!(bob.inbox().as_slice(), [ServerToClient::OpponentHasChosen]));

        choose(&mut lobby, &bob, Choice::Scissors);
        let a_rounds = round_results(&alice.inbox());
        let b_rounds = round_results(&bob.inbox());
        assert_eq!(a_rounds.len(), 1);
        assert_eq!(a_rounds, b_rounds);
        assert_eq!(a_rounds[0].result, Outcome::Player1);
        assert_eq!(a_rounds[0].verdict_for(alice.id), Some(Verdict::Win));
        assert_eq!(tally(&lobby, "TH"), (1, 0, 0));
        assert_eq!(tally(&lobby, "US"), (0, 1, 0));

        choose(&mut lobby, &alice, Choice::Paper);
        choose(&mut lobby, &bob, Choice::Paper);
        let rounds = round_results(&bob.inbox());
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].result, Outcome::Draw);
        assert_eq!(rounds[0].round, 2);
        assert_eq!(tally(&lobby, "TH"), (1, 0, 1));
        assert_eq!(tally(&lobby, "US"), (0, 1, 1));
    }

    #[test]
    fn round_result_carries_both_standings() {
        let (mut lobby, mut alice, bob) = seated_pair();
        choose(&mut lobby, &alice, Choice::Scissors);
        choose(&mut lobby, &bob, Choice::Rock);

        let standings = alice
            .inbox()
            .into_iter()
            .find_map(|m| match m {
                ServerToClient::RoundResult { standings, .. } => Some(standings),
                _ => None,
            })
            .expect("round result");
        let codes: Vec<&str> = standings.iter().map(|e| e.country_code.as_str()).collect();
        assert_eq!(codes, ["TH", "US"]);
        assert_eq!(standings[1].wins, 1);
    }

    #[test]
    fn same_country_match_counts_both_sides() {
        let mut lobby = Lobby::new();
        let a = Player::new();
        let b = Player::new();
        join(&mut lobby, &a, "A", "TH", "Thailand");
        join(&mut lobby, &b, "B", "TH", "Thailand");
        choose(&mut lobby, &a, Choice::Rock);
        choose(&mut lobby, &b, Choice::Rock);
        assert_eq!(tally(&lobby, "TH"), (0, 0, 2));
    }

    #[test]
    fn disconnect_mid_round_scores_nothing() {
        let (mut lobby, mut alice, bob) = seated_pair();
        let room = lobby.room_of(alice.id).expect("alice seated");

        choose(&mut lobby, &alice, Choice::Rock);
        lobby.disconnect(bob.id);

        assert!(matches!(alice.inbox().as_slice(), [ServerToClient::OpponentLeft { .. }]));
        assert_eq!(tally(&lobby, "TH"), (0, 0, 0));
        assert_eq!(tally(&lobby, "US"), (0, 0, 0));
        assert_eq!(lobby.connection_count(), 1);
        assert_eq!(lobby.playing_count(), 0);
        // alice keeps her room and it takes the next arrival
        assert_eq!(lobby.room_of(alice.id), Some(room.clone()));

        let mut carol = Player::new();
        join(&mut lobby, &carol, "Carol", "JP", "Japan");
        assert_eq!(lobby.room_of(carol.id), Some(room));
        let faces_alice = |m: &ServerToClient| {
            matches!(m, ServerToClient::RoomReady { opponent, .. } if opponent.id == alice.id)
        };
        assert!(carol.inbox().iter().any(faces_alice));

        // the abandoned choice did not carry over
        choose(&mut lobby, &carol, Choice::Paper);
        assert!(round_results(&alice.inbox()).is_empty());
    }

    #[test]
    fn last_member_leaving_deletes_room() {
        let mut lobby = Lobby::new();
        let a = Player::new();
        join(&mut lobby, &a, "A", "TH", "Thailand");
        assert_eq!(lobby.room_count(), 1);
        lobby.disconnect(a.id);
        assert_eq!(lobby.room_count(), 0);
        assert_eq!(lobby.connection_count(), 0);
        // leaderboard entries outlive their players
        assert!(lobby.leaderboard_entry("TH").is_some());
        lobby.disconnect(a.id);
    }

    #[test]
    fn lone_choice_waits_for_an_opponent() {
        let mut lobby = Lobby::new();
        let mut a = Player::new();
        join(&mut lobby, &a, "A", "TH", "Thailand");
        a.inbox();
        choose(&mut lobby, &a, Choice::Rock);
        assert!(a.inbox().is_empty());
    }

    #[test]
    fn newcomer_learns_of_a_choice_made_while_alone() {
        let mut lobby = Lobby::new();
        let mut a = Player::new();
        let mut b = Player::new();
        join(&mut lobby, &a, "A", "TH", "Thailand");
        choose(&mut lobby, &a, Choice::Rock);
        a.inbox();

        join(&mut lobby, &b, "B", "US", "United States");
        match b.inbox().as_slice() {
            [
                ServerToClient::RoomAssigned { .. },
                ServerToClient::RoomReady { .. },
                ServerToClient::OpponentHasChosen,
            ] => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(a.inbox().as_slice(), [ServerToClient::RoomReady { .. }]));

        choose(&mut lobby, &b, Choice::Scissors);
        assert_eq!(round_results(&b.inbox()).len(), 1);
        assert_eq!(lobby.country_stats("TH").wins, 1);
        assert_eq!(lobby.country_stats("US").losses, 1);
    }

    #[test]
    fn malformed_intents_leave_state_alone() {
        let mut lobby = Lobby::new();
        let p = Player::new();

        let err = lobby.handle(
            p.id,
            ClientToServer::Join {
                name: "   ".into(),
                country: None,
                country_code: Some("TH".into()),
                flag: None,
            },
            &p.tx,
        );
        assert_eq!(err, Err(LobbyError::EmptyName));
        assert_eq!(lobby.connection_count(), 0);
        assert!(lobby.leaderboard_entry("TH").is_none());

        assert_eq!(
            lobby.handle(p.id, ClientToServer::Choose { choice: Choice::Rock }, &p.tx),
            Err(LobbyError::NotJoined)
        );
        assert_eq!(
            lobby.handle(p.id, ClientToServer::RequestRematch, &p.tx),
            Err(LobbyError::NotJoined)
        );

        join(&mut lobby, &p, "P", "TH", "Thailand");
        let again = lobby.handle(
            p.id,
            ClientToServer::Join {
                name: "P".into(),
                country: None,
                country_code: None,
                flag: None,
            },
            &p.tx,
        );
        assert_eq!(again, Err(LobbyError::AlreadyJoined));
        assert_eq!(lobby.room_count(), 1);
    }

    #[test]
    fn rematch_reaches_only_the_room() {
        let (mut lobby, mut alice, mut bob) = seated_pair();
        let mut carol = Player::new();
        join(&mut lobby, &carol, "Carol", "JP", "Japan");
        carol.inbox();

        lobby
            .handle(alice.id, ClientToServer::RequestRematch, &alice.tx)
            .expect("rematch");
        assert!(matches!(alice.inbox().as_slice(), [ServerToClient::RematchReady]));
        assert!(matches!(bob.inbox().as_slice(), [ServerToClient::RematchReady]));
        assert!(carol.inbox().is_empty());

        choose(&mut lobby, &alice, Choice::Rock);
        choose(&mut lobby, &bob, Choice::Paper);
        assert!(carol.inbox().is_empty());
    }

    #[test]
    fn queries_answer_the_caller() {
        let (mut lobby, mut alice, _bob) = seated_pair();
        let stranger = Player::new();

        lobby
            .handle(
                stranger.id,
                ClientToServer::CountryStats {
                    country_code: "ZZ".into(),
                },
                &alice.tx,
            )
            .expect("stats");
        lobby
            .handle(stranger.id, ClientToServer::ActivePlayers, &alice.tx)
            .expect("players");

        match alice.inbox().as_slice() {
            [ServerToClient::CountryStats { stats }, ServerToClient::ActivePlayers { players }] => {
                assert_eq!(stats.country, UNKNOWN_COUNTRY);
                assert_eq!(stats.games(), 0);
                let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
                assert!(names.contains(&"Alice") && names.contains(&"Bob"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[cfg(test)]
mod api_tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
    };

    fn state_with_results() -> AppState {
        let state = AppState::new(ServerConfig::default());
        {
            let mut lobby = state.lobby.lock();
            let (tx, _rx) = mpsc::unbounded_channel();
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
            let tag = |code: &str| {
                CountryTag::from_parts(Some(code.into()), Some(code.into()), None)
            };
            lobby.join(a, "A".into(), tag("TH"), tx.clone()).unwrap();
            lobby.join(b, "B".into(), tag("US"), tx).unwrap();
            lobby.choose(a, Choice::Rock).unwrap();
            lobby.choose(b, Choice::Scissors).unwrap();
        }
        state
    }

    #[tokio::test]
    async fn leaderboard_sorted_by_wins() {
        let state = state_with_results();
        let body = api::leaderboard(State(state.clone()), Query(LeaderboardParams::default()))
            .await
            .0;
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].country_code, "TH");
        assert_eq!(body[0].wins, 1);

        let capped = api::leaderboard(State(state), Query(LeaderboardParams { limit: Some(1) }))
            .await
            .0;
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn unknown_country_is_404() {
        let state = state_with_results();
        let found = api::leaderboard_one(State(state.clone()), Path("US".to_string())).await;
        assert_eq!(found.map(|j| j.0.losses).ok(), Some(1));

        let missing = api::leaderboard_one(State(state), Path("ZZ".to_string()))
            .await
            .into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}

#[cfg(test)]
mod socket_tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn serve() -> (std::net::SocketAddr, AppState) {
        let state = AppState::new(ServerConfig::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr, state)
    }

    async fn next_msg(ws: &mut Ws) -> ServerToClient {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for server")
                .expect("stream ended")
                .expect("websocket error");
            if let WsMessage::Text(text) = frame {
                return serde_json::from_str(&text).expect("decodable server message");
            }
        }
    }

    async fn send(ws: &mut Ws, cmd: &ClientToServer) {
        ws.send(WsMessage::Text(serde_json::to_string(cmd).unwrap()))
            .await
            .unwrap();
    }

    async fn connect_and_join(url: &str, name: &str, code: &str) -> (Ws, Uuid) {
        let (mut ws, _) = connect_async(url).await.expect("connect");
        let ServerToClient::Hello { your_id } = next_msg(&mut ws).await else {
            panic!("expected Hello");
        };
        send(
            &mut ws,
            &ClientToServer::Join {
                name: name.to_string(),
                country: None,
                country_code: Some(code.to_string()),
                flag: None,
            },
        )
        .await;
        assert!(matches!(next_msg(&mut ws).await, ServerToClient::RoomAssigned { .. }));
        (ws, your_id)
    }

    #[tokio::test]
    async fn two_players_play_a_round_over_websocket() {
        let (addr, state) = serve().await;
        let url = format!("ws://{addr}/ws");

        let (mut alice, alice_id) = connect_and_join(&url, "Alice", "TH").await;
        let (mut bob, _) = connect_and_join(&url, "Bob", "US").await;

        assert!(matches!(next_msg(&mut bob).await, ServerToClient::RoomReady { .. }));
        match next_msg(&mut alice).await {
            ServerToClient::RoomReady { opponent, .. } => assert_eq!(opponent.name, "Bob"),
            other => panic!("expected RoomReady, got {:?}", other),
        }

        send(&mut alice, &ClientToServer::Choose { choice: Choice::Rock }).await;
        assert!(matches!(next_msg(&mut bob).await, ServerToClient::OpponentHasChosen));
        send(&mut bob, &ClientToServer::Choose { choice: Choice::Scissors }).await;

        for ws in [&mut alice, &mut bob] {
            match next_msg(ws).await {
                ServerToClient::RoundResult { round, .. } => {
                    assert_eq!(round.verdict_for(alice_id), Some(Verdict::Win));
                }
                other => panic!("expected RoundResult, got {:?}", other),
            }
        }
        assert_eq!(state.lobby.lock().country_stats("TH").wins, 1);

        alice.send(WsMessage::Text("not json".into())).await.unwrap();
        assert!(matches!(next_msg(&mut alice).await, ServerToClient::Error { .. }));

        bob.close(None).await.unwrap();
        assert!(matches!(next_msg(&mut alice).await, ServerToClient::OpponentLeft { .. }));
        assert_eq!(state.lobby.lock().connection_count(), 1);
    }

    #[tokio::test]
    async fn leaderboard_routes_answer_at_root_and_under_api() {
        let (addr, state) = serve().await;
        {
            let mut lobby = state.lobby.lock();
            let (tx, _rx) = mpsc::unbounded_channel();
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
            let tag = |code: &str| CountryTag::from_parts(None, Some(code.into()), None);
            lobby.join(a, "A".into(), tag("TH"), tx.clone()).unwrap();
            lobby.join(b, "B".into(), tag("US"), tx).unwrap();
            lobby.choose(a, Choice::Paper).unwrap();
            lobby.choose(b, Choice::Rock).unwrap();
        }
        let base = format!("http://{addr}");
        let http = reqwest::Client::new();

        for prefix in ["", "/api"] {
            let board: Vec<LeaderboardEntry> = http
                .get(format!("{base}{prefix}/leaderboard?limit=1"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(board.len(), 1);
            assert_eq!(board[0].country_code, "TH");

            let us: LeaderboardEntry = http
                .get(format!("{base}{prefix}/leaderboard/US"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(us.losses, 1);

            let missing = http
                .get(format!("{base}{prefix}/leaderboard/ZZ"))
                .send()
                .await
                .unwrap();
            assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
            let body: serde_json::Value = missing.json().await.unwrap();
            assert_eq!(body["error"], "Country not found");
        }
    }
}
