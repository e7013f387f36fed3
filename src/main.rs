//! askbench - ask a benchmark results database questions in plain English.

use std::io::Read as _;

use tracing::{error, info};

use askbench::cli::{Cli, Command};
use askbench::config::Config;
use askbench::db::SqliteExecutor;
use askbench::error::{AskbenchError, Result};
use askbench::llm::{create_client, QueryService};
use askbench::output;
use askbench::logging;
use askbench::server::{self, AppState};

#[tokio::main]
async fn main() {
    // Load .env before logging so RUST_LOG from it applies.
    dotenvy::dotenv().ok();
    logging::init_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    let config = Config::load_from_file(&config_path)?;

    match cli.command {
        Command::Ask(args) => {
            let settings = args.common.resolve(&config)?;
            let format = args.parse_output_format()?;

            let question = match args.question_text() {
                Some(question) => question,
                None => read_question_from_stdin()?,
            };

            let client = create_client(settings.provider, settings.model.as_deref())?;
            let service = QueryService::new(client, settings.allow_writes);

            let executor = SqliteExecutor::open(&settings.db_path).await?;
            let outcome = service.answer_question(&question, &executor).await;
            executor.close().await;
            let outcome = outcome?;

            let rendered = output::render(&question, &outcome, format)?;
            println!("{}", rendered.trim_end());
            Ok(())
        }
        Command::Serve(args) => {
            let settings = args.common.resolve(&config)?;
            let listen = args.listen_addr(&config);

            let client = create_client(settings.provider, settings.model.as_deref())?;
            let service = QueryService::new(client, settings.allow_writes);

            // Probe the database path so a bad one fails at startup.
            let executor = SqliteExecutor::open(&settings.db_path).await?;
            executor.close().await;

            if settings.allow_writes {
                info!("Generated write statements are enabled");
            }

            info!(db = %settings.db_path.display(), "Starting server");
            server::run(
                AppState {
                    service,
                    db_path: settings.db_path,
                },
                &listen,
            )
            .await
        }
    }
}

/// Reads the question from stdin when it is not given as an argument.
fn read_question_from_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| AskbenchError::validation(format!("Failed to read question: {}", e)))?;

    let question = input.trim().to_string();
    if question.is_empty() {
        return Err(AskbenchError::validation("Question must not be empty"));
    }
    Ok(question)
}
