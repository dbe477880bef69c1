use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use command_gate::clock::{Clock, SystemClock};
use command_gate::security::signature;

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Client for the command gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:30120")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gate is up
    Ping,
    /// Submit a command for execution
    Exec {
        /// Shared secret sent as `token`
        #[arg(short, long)]
        token: String,

        /// Send an empty hmac instead of signing
        #[arg(long)]
        no_sign: bool,

        /// Command line, e.g. "/say hello"
        command: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Ping => {
            let res = client.get(format!("{}/zcf/ping", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Exec {
            token,
            no_sign,
            command,
        } => {
            let timestamp = SystemClock.now_secs();
            let hmac = if no_sign {
                String::new()
            } else {
                signature::sign(&token, timestamp, &command)
            };

            let res = client
                .post(format!("{}/zcf/exec", base))
                .json(&json!({
                    "token": token,
                    "timestamp": timestamp,
                    "command": command,
                    "hmac": hmac,
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => {
            let rendered = serde_json::to_string_pretty(&json)?;
            if status.is_success() {
                println!("{}", rendered);
            } else {
                eprintln!("Error: gate returned status {}", status);
                eprintln!("{}", rendered);
            }
        }
        Err(_) => {
            eprintln!("Error: gate returned status {}", status);
            eprintln!("Response: {}", text);
        }
    }
    Ok(())
}
