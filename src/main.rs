use clap::{Parser, Subcommand};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rps-combined")]
#[command(about = "Rock-paper-scissors - server, terminal client and demo bot launcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server and a number of demo bots against it
    Both {
        /// Number of bots to start
        #[arg(short, long, default_value = "2")]
        bots: u32,
        /// Port for the server
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
    /// Run only the server
    Server {
        /// Port for the server
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
    /// Run the interactive terminal client
    Client {
        /// Server port on localhost
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
    /// Run demo bots only (no server)
    Bots {
        /// Number of bots to start
        #[arg(short, long, default_value = "2")]
        bots: u32,
        /// Server port on localhost
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Both { bots, port } => {
            run_both(bots, port);
        }
        Commands::Server { port } => {
            run_server(port);
        }
        Commands::Client { port } => {
            run_cargo(&["run", "--bin", "cli_client"], port, None);
        }
        Commands::Bots { bots, port } => {
            run_bots(bots, port);
        }
    }
}

fn run_both(bots: u32, port: u16) {
    println!("🚀 Starting server on port {} with {} bots", port, bots);

    let server_handle = thread::spawn(move || {
        run_server(port);
    });

    // Wait a moment for server to start
    thread::sleep(Duration::from_millis(1500));

    run_bots(bots, port);

    let _ = server_handle.join();
}

fn run_server(port: u16) {
    run_cargo(&["run", "-p", "rps-server"], port, None);
}

fn run_bots(bots: u32, port: u16) {
    let mut handles = Vec::new();
    for i in 1..=bots {
        println!("🤖 Starting bot {}...", i);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(500 * i as u64)); // Stagger arrivals
            let name = format!("Bot{}", i);
            run_cargo(&["run", "--bin", "demo_cli", "--"], port, Some(&name));
        });
        handles.push(handle);
    }

    println!("✅ All bots started. Press Ctrl+C to stop.");

    for handle in handles {
        let _ = handle.join();
    }
}

fn run_cargo(args: &[&str], port: u16, extra: Option<&str>) {
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    if let Some(extra) = extra {
        cmd.arg(extra);
    }
    let status = cmd
        .env("PORT", port.to_string())
        .env("RPS_SERVER_URL", format!("ws://127.0.0.1:{}/ws", port))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status();

    match status {
        Ok(exit_status) => {
            if !exit_status.success() {
                eprintln!("❌ `cargo {}` exited with error: {}", args.join(" "), exit_status);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to run `cargo {}`: {}", args.join(" "), e);
            std::process::exit(1);
        }
    }
}
