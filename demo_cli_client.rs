use futures_util::{SinkExt, StreamExt};
use rps_protocol::{Choice, ClientToServer, ServerToClient, Verdict};
use std::env;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const DEFAULT_URL: &str = "ws://127.0.0.1:5000/ws";
const DEFAULT_ROUNDS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get player name from command line argument or use default
    let args: Vec<String> = env::args().collect();
    let player_name = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| format!("Bot{}", std::process::id()));
    let rounds: u32 = args
        .get(2)
        .and_then(|r| r.parse().ok())
        .unwrap_or(DEFAULT_ROUNDS);

    println!("🤖 Rock Paper Scissors demo bot: {}", player_name);

    let url = env::var("RPS_SERVER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    println!("🔗 [{}] Connecting to {}...", player_name, url);

    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut write, mut read) = ws_stream.split();

    let join_msg = ClientToServer::Join {
        name: player_name.clone(),
        country: env::var("BOT_COUNTRY").ok(),
        country_code: env::var("BOT_COUNTRY_CODE").ok(),
        flag: None,
    };
    write.send(Message::Text(serde_json::to_string(&join_msg)?)).await?;

    let mut my_id = None;
    let mut played = 0u32;
    let mut record = (0u32, 0u32, 0u32);

    while let Some(msg) = read.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                println!("🔌 [{}] Connection closed by server", player_name);
                break;
            }
            Err(e) => {
                println!("❌ [{}] WebSocket error: {}", player_name, e);
                break;
            }
            _ => continue,
        };
        let Ok(server_msg) = serde_json::from_str::<ServerToClient>(&text) else {
            continue;
        };

        let reply = match server_msg {
            ServerToClient::Hello { your_id } => {
                my_id = Some(your_id);
                None
            }
            ServerToClient::RoomReady { opponent, .. } => {
                println!("🎮 [{}] Playing against {}", player_name, opponent.name);
                Some(pick(&player_name))
            }
            ServerToClient::RoundResult { round, .. } => {
                played += 1;
                match my_id.and_then(|id| round.verdict_for(id)) {
                    Some(Verdict::Win) => record.0 += 1,
                    Some(Verdict::Loss) => record.1 += 1,
                    Some(Verdict::Draw) => record.2 += 1,
                    None => {}
                }
                println!(
                    "🏁 [{}] Round {}: {:?} ({}W/{}L/{}D)",
                    player_name, round.round, round.result, record.0, record.1, record.2
                );
                if played >= rounds {
                    break;
                }
                Some(pick(&player_name))
            }
            ServerToClient::OpponentLeft { message } => {
                println!("🚪 [{}] {}", player_name, message);
                None
            }
            ServerToClient::Error { message } => {
                println!("❌ [{}] Error: {}", player_name, message);
                None
            }
            _ => None,
        };

        if let Some(response) = reply {
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            write.send(Message::Text(serde_json::to_string(&response)?)).await?;
        }
    }

    let _ = write.send(Message::Close(None)).await;
    println!("👋 {} disconnected after {} rounds", player_name, played);
    Ok(())
}

fn pick(player_name: &str) -> ClientToServer {
    let choice = Choice::random();
    println!("🎲 [{}] Throwing {}", player_name, choice);
    ClientToServer::Choose { choice }
}
