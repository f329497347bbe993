//! es-glance - A lightweight, AI-first explorer for Elasticsearch-compatible stores.

use es_glance::cli::Cli;
use es_glance::commands::{render, run_line, CommandContext};
use es_glance::config::{Config, ConnectionConfig};
use es_glance::connection::Connection;
use es_glance::error::{Result, SearchError};
use es_glance::llm::{LlmProvider, LlmQueryGenerator};
use es_glance::logging;
use es_glance::session::{Session, SessionSettings};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.is_scripted() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("Error: {}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the command loop. Returns false if a scripted command failed.
async fn run(cli: Cli) -> Result<bool> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let provider = match cli.llm_provider().map_err(SearchError::config)? {
        Some(provider) => provider,
        None => config
            .llm
            .provider
            .parse::<LlmProvider>()
            .map_err(SearchError::config)?,
    };

    let mut settings = SessionSettings::from_config(&config);
    if cli.model.is_some() {
        settings.model = cli.model.clone();
    }
    settings.api_key = cli.api_key.clone();
    if cli.no_flatten {
        settings.flatten = false;
    }

    let generator = Arc::new(LlmQueryGenerator::new(provider, settings.model.clone()));
    let session = Session::new(generator, settings);
    info!(provider = %provider, "Session created");

    // Precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    match resolve_connection(&cli, &config)? {
        Some(conn) => {
            let connection = Connection::from_config(&conn)?;
            info!("Connection: {}", connection.display_string());
            session.connect(connection)?;
        }
        None => warn!("No search store configured"),
    }

    if let Some(index) = &cli.index {
        session.select_collection(index)?;
    }

    let ctx = CommandContext::new(&session, &config);

    if !cli.exec.is_empty() {
        return Ok(run_script(&ctx, cli.exec.iter().map(String::as_str)).await);
    }

    if let Some(script) = &cli.script {
        let content = if script == "-" {
            read_stdin().await?
        } else {
            tokio::fs::read_to_string(script)
                .await
                .map_err(|e| SearchError::config(format!("Failed to read script {script}: {e}")))?
        };
        return Ok(run_script(&ctx, content.lines()).await);
    }

    run_interactive(&ctx).await?;
    Ok(true)
}

/// Runs each command in order, stopping at the first exit request.
async fn run_script<'a>(
    ctx: &CommandContext<'_>,
    lines: impl Iterator<Item = &'a str>,
) -> bool {
    let mut ok = true;
    for line in lines {
        let output = run_line(ctx, line).await;
        ok &= !output.is_error();

        print!("{}", render(&output));
        if output.is_exit() {
            break;
        }
    }
    ok
}

async fn run_interactive(ctx: &CommandContext<'_>) -> Result<()> {
    println!("es-glance v{}", env!("CARGO_PKG_VERSION"));
    match ctx.session.connection_display() {
        Some(display) => println!("Connected to {display}"),
        None => println!("Not connected. Use /connect <url> or /help."),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(ctx);
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| SearchError::internal(format!("Failed to read input: {e}")))?
        else {
            break;
        };

        let output = run_line(ctx, &line).await;
        print!("{}", render(&output));
        if output.is_exit() {
            break;
        }
    }
    Ok(())
}

fn prompt(ctx: &CommandContext<'_>) {
    let label = ctx.session.collection().unwrap_or_default();
    print!("{label}> ");
    let _ = std::io::stdout().flush();
}

async fn read_stdin() -> Result<String> {
    use tokio::io::AsyncReadExt;

    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .map_err(|e| SearchError::config(format!("Failed to read script from stdin: {e}")))?;
    Ok(content)
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(SearchError::config(format!(
                    "Connection '{name}' not found in config file"
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    let mut connection = connection.unwrap_or_default();
    connection.apply_env_defaults();

    Ok(connection.url.is_some().then_some(connection))
}
