use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-logs")]
#[command(about = "Browse the request logs of a running logging proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available log files, newest first
    List,
    /// Show the most recent records of a log file
    Show {
        /// Log file name, e.g. proxy-2024-01-31.log (defaults to today's)
        filename: Option<String>,

        /// Print one compact JSON record per line
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::List => {
            let res = client.get(format!("{}/proxy-logs", base)).send().await?;
            if let Some(json) = fetch_json(res).await? {
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
        Commands::Show { filename, raw } => {
            let filename = match filename {
                Some(name) => name,
                None => current_log(&client, base).await?,
            };
            let res = client
                .get(format!("{}/proxy-logs/{}", base, filename))
                .send()
                .await?;
            let Some(json) = fetch_json(res).await? else {
                return Ok(());
            };
            if raw {
                for record in json["logs"].as_array().into_iter().flatten() {
                    println!("{}", serde_json::to_string(record)?);
                }
                eprintln!(
                    "{}: {} of {} lines",
                    filename,
                    json["logs"].as_array().map_or(0, Vec::len),
                    json["totalLines"]
                );
            } else {
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
    }

    Ok(())
}

async fn current_log(client: &reqwest::Client, base: &str) -> Result<String, Box<dyn std::error::Error>> {
    let res = client.get(format!("{}/proxy-logs", base)).send().await?;
    let json: Value = res.error_for_status()?.json().await?;
    json["currentLog"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "proxy did not report a current log file".into())
}

async fn fetch_json(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }

    Ok(Some(res.json().await?))
}
