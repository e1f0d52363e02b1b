use futures_util::{SinkExt, StreamExt};
use rps_protocol::{Choice, ClientToServer, ServerToClient};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

const DEFAULT_URL: &str = "ws://127.0.0.1:5000/ws";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("✊✋✌️  Rock Paper Scissors CLI Client");
    println!("===================================");

    let player_name = prompt("Enter your name: ")?;
    if player_name.is_empty() {
        println!("❌ Name cannot be empty");
        return Ok(());
    }
    let country_code = prompt("Country code (blank for unknown): ")?.to_uppercase();
    let country = if country_code.is_empty() {
        String::new()
    } else {
        prompt("Country name: ")?
    };

    // Connect to server
    let url = std::env::var("RPS_SERVER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    println!("🔗 Connecting to {}...", url);

    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("✅ Connected to server!");

    let (mut write, mut read) = ws_stream.split();

    let join_msg = ClientToServer::Join {
        name: player_name.clone(),
        country: Some(country).filter(|c| !c.is_empty()),
        country_code: Some(country_code).filter(|c| !c.is_empty()),
        flag: None,
    };
    write.send(Message::Text(serde_json::to_string(&join_msg)?)).await?;
    println!("🚪 Looking for an opponent...");

    // Handle incoming messages
    tokio::spawn(async move {
        let mut my_id: Option<Uuid> = None;
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Ok(server_msg) = serde_json::from_str::<ServerToClient>(&text) {
                        handle_server_message(server_msg, &mut my_id);
                    }
                }
                Ok(Message::Close(_)) => {
                    println!("🔌 Connection closed by server");
                    break;
                }
                Err(e) => {
                    println!("❌ WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    println!("\n📋 Commands available:");
    println!("  rock | paper | scissors (r/p/s) - Make your choice");
    println!("  again                           - Ask for a rematch");
    println!("  stats <CODE>                    - Show a country's record");
    println!("  players                         - List connected players");
    println!("  quit                            - Exit the game");
    println!("\nType commands and press Enter:");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();

        if line == "quit" {
            break;
        }

        match parse_command(line) {
            Some(msg) => {
                let json = serde_json::to_string(&msg)?;
                write.send(Message::Text(json)).await?;
            }
            None => println!("❓ Unknown command: {}", line),
        }
    }

    let _ = write.send(Message::Close(None)).await;
    println!("👋 Goodbye, {}!", player_name);
    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn handle_server_message(msg: ServerToClient, my_id: &mut Option<Uuid>) {
    match msg {
        ServerToClient::Hello { your_id } => {
            *my_id = Some(your_id);
        }
        ServerToClient::RoomAssigned { room_id } => {
            println!("🏠 Seated in {}", room_id);
        }
        ServerToClient::RoomReady { opponent, .. } => {
            println!("🎮 Opponent found: {} {}", opponent.country.flag, opponent.name);
            println!("   Make your choice!");
        }
        ServerToClient::OpponentHasChosen => {
            println!("⏳ Your opponent has chosen...");
        }
        ServerToClient::RoundResult { round, standings } => {
            let Some(me) = *my_id else { return };
            let (verdict, opponent) = (round.verdict_for(me), round.opponent_of(me));
            if let (Some(verdict), Some(opponent)) = (verdict, opponent) {
                println!("\n🎭 Round {}", round.round);
                println!("   {} chose {}", opponent.profile.name, opponent.choice);
                println!("🏆 {}", verdict);
            }
            for entry in standings {
                println!(
                    "   {} {}: {}W / {}L / {}D",
                    entry.flag, entry.country, entry.wins, entry.losses, entry.draws
                );
            }
            println!("   Type 'again' for a rematch.");
        }
        ServerToClient::RematchReady => {
            println!("🔁 Next round! Make your choice.");
        }
        ServerToClient::OpponentLeft { message } => {
            println!("🚪 {}. Waiting for a new opponent...", message);
        }
        ServerToClient::CountryStats { stats } => {
            println!(
                "📊 {} {} ({}): {}W / {}L / {}D",
                stats.flag, stats.country, stats.country_code, stats.wins, stats.losses, stats.draws
            );
        }
        ServerToClient::ActivePlayers { players } => {
            println!("👥 Players online ({}):", players.len());
            for p in players {
                println!("  {} {} ({})", p.country.flag, p.name, p.country.country_code);
            }
        }
        ServerToClient::Error { message } => {
            println!("❌ Error: {}", message);
        }
    }
}

fn parse_command(input: &str) -> Option<ClientToServer> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let first = parts.first()?;

    match first.to_lowercase().as_str() {
        "again" => Some(ClientToServer::RequestRematch),
        "players" => Some(ClientToServer::ActivePlayers),
        "stats" => parts.get(1).map(|code| ClientToServer::CountryStats {
            country_code: code.to_uppercase(),
        }),
        other => other
            .parse::<Choice>()
            .ok()
            .map(|choice| ClientToServer::Choose { choice }),
    }
}
