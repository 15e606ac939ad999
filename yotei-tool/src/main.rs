mod config;
mod error;
mod serve;

use std::io::Read;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use yotei_core::{Pipeline, ReferenceMoment, legacy};

use crate::config::{load_api_key, load_config, resolve_timezone};
use crate::error::YtError;

#[derive(Parser)]
#[command(name = "yt")]
#[command(about = "Turn free-form messages into schedules or todos", long_about = None)]
struct Cli {
    /// IANA timezone the reference moment is taken in (default: Asia/Tokyo)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Model to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one message and print the result as JSON
    Classify {
        /// The message
        text: String,

        /// Also print the todo confidence score
        #[arg(long)]
        with_confidence: bool,
    },

    /// Serve the POST /process/ endpoint
    Serve {
        /// Address to listen on (default: 127.0.0.1:8000)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Parse a bracketed text-protocol answer (read from stdin if omitted)
    Legacy {
        text: Option<String>,

        /// Year for the MM/DD date (default: the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Input is a `data:` event stream; use the last event's answer
        #[arg(long)]
        stream: bool,

        /// Treat the input as a message and ask the model for the answer
        #[arg(long, conflicts_with_all = ["year", "stream"])]
        ask: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config()?;
    let timezone = resolve_timezone(cli.timezone.as_deref(), &config)?;

    match cli.command {
        Command::Classify {
            text,
            with_confidence,
        } => {
            let client = config.client(load_api_key(&config)?, cli.model);
            let pipeline = Pipeline::with_timezone(client, timezone);

            let output = pipeline.process(&text).await.map_err(YtError::from)?;
            println!("{}", serde_json::to_string(&output)?);
            if with_confidence {
                if let Some(confidence) = output.todo_confidence() {
                    println!("confidence: {confidence}");
                }
            }
        }
        Command::Serve { listen } => {
            let client = config.client(load_api_key(&config)?, cli.model);
            let pipeline = Pipeline::with_timezone(client, timezone);
            serve::run(pipeline, &config.listen_addr(listen)).await?;
        }
        Command::Legacy {
            text,
            year,
            stream,
            ask,
        } => {
            let input = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            if ask {
                let client = config.client(load_api_key(&config)?, cli.model);
                let now = ReferenceMoment::now(timezone);
                let output = legacy::process(&client, input.trim(), now)
                    .await
                    .map_err(YtError::from)?;
                println!("{}", serde_json::to_string(&output)?);
                return Ok(());
            }
            let answer = if stream {
                legacy::aggregate_stream(&input).map_err(YtError::from)?
            } else {
                input
            };
            let year = year.unwrap_or_else(|| ReferenceMoment::now(timezone).year());

            let output = legacy::parse(&answer, year).map_err(YtError::from)?;
            println!("{}", serde_json::to_string(&output)?);
        }
    }

    Ok(())
}
