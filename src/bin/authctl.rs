use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "authctl")]
#[command(about = "Operator CLI for the payment authorization service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin bearer token, if the service requires one
    #[arg(short, long, env = "AUTHCTL_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the health report
    Health,
    /// Replace the fault injection config
    FaultInject {
        #[arg(long)]
        enabled: bool,
        #[arg(long, default_value_t = 0)]
        latency_ms: i64,
        #[arg(long, default_value_t = 1.0)]
        success_rate: f64,
    },
    /// Show the active fault injection config
    FaultStatus,
    /// Submit a test authorization
    Authorize {
        #[arg(long, default_value_t = 10.0)]
        amount: f64,
        #[arg(long, default_value = "visa")]
        processor: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
        Commands::FaultInject {
            enabled,
            latency_ms,
            success_rate,
        } => {
            client
                .post(format!("{}/admin/fault-inject", cli.url))
                .headers(headers)
                .json(&json!({
                    "enabled": enabled,
                    "latency_ms": latency_ms,
                    "success_rate": success_rate,
                }))
                .send()
                .await?
        }
        Commands::FaultStatus => {
            client
                .get(format!("{}/admin/fault-inject", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Authorize { amount, processor } => {
            client
                .post(format!("{}/v1/authorize", cli.url))
                .json(&json!({
                    "card_number": "4111111111111111",
                    "amount": amount,
                    "currency": "USD",
                    "merchant": "authctl",
                    "processor": processor,
                }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    // /health answers 503 with a full report while the breaker is open.
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if !status.is_success() {
        eprintln!("Error: service returned status {status}");
        std::process::exit(1);
    }
    Ok(())
}
