use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    ControllerOptions, ImdbId, MovieDetailsFetch, MovieSearch, OmdbClient, QueryController,
    QueryKey, ResultState,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;

/// Search OMDb from the terminal. Every stdin line replaces the search text;
/// `:open <imdbID>` shows details, `:close` hides them, `:quit` exits.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "popcorn.toml")]
    config: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    min_query_len: Option<usize>,
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(QueryKey),
    Open(ImdbId),
    Close,
    Quit,
}

fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    let (command, argument) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    match command {
        ":open" => Input::Open(ImdbId::from(argument.trim())),
        ":close" => Input::Close,
        ":quit" | ":q" => Input::Quit,
        // Search text is taken verbatim, spaces included.
        _ => Input::Search(QueryKey::from(line.trim_end_matches(['\r', '\n']))),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config);
    if let Some(v) = args.base_url {
        settings.omdb_base_url = v;
    }
    if let Some(v) = args.api_key {
        settings.omdb_api_key = v;
    }
    if let Some(v) = args.min_query_len {
        settings.min_query_len = v;
    }
    if let Some(v) = args.timeout_secs {
        settings.request_timeout_secs = v;
    }

    let base_url = settings.validated_base_url()?;
    if settings.omdb_api_key.is_empty() {
        warn!("no OMDb api key configured; set OMDB_API_KEY or pass --api-key");
    }
    info!(
        base_url = %base_url,
        min_query_len = settings.min_query_len,
        "popcorn starting"
    );

    let client = OmdbClient::with_timeout(
        base_url,
        settings.omdb_api_key.clone(),
        Duration::from_secs(settings.request_timeout_secs),
    )?;

    let (close_tx, mut close_rx) = mpsc::unbounded_channel();
    let search = QueryController::new(
        Arc::new(MovieSearch::new(client.clone())),
        ControllerOptions::new("search", settings.min_query_len),
    )
    .with_key_change_hook(move |_| {
        let _ = close_tx.send(());
    });
    let details = QueryController::new(
        Arc::new(MovieDetailsFetch::new(client)),
        ControllerOptions::new("details", 1),
    );

    let mut search_rx = search.subscribe();
    let mut details_rx = details.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut shown_details = ResultState::Idle;

    loop {
        // Piped input: keep running until the last fetches settle.
        if !stdin_open
            && !search.state().is_loading()
            && !details.state().is_loading()
            && !search_rx.has_changed().unwrap_or(false)
            && !details_rx.has_changed().unwrap_or(false)
        {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("failed to read stdin")? else {
                    stdin_open = false;
                    continue;
                };
                match parse_line(&line) {
                    Input::Search(query) => {
                        search.on_key_change(query).await;
                    }
                    Input::Open(id) => {
                        details.on_key_change(id).await;
                    }
                    Input::Close => {
                        details.on_key_change(QueryKey::default()).await;
                    }
                    Input::Quit => break,
                }
            }
            Some(()) = close_rx.recv() => {
                details.on_key_change(QueryKey::default()).await;
            }
            Ok(()) = search_rx.changed() => {
                let state = search_rx.borrow_and_update().clone();
                if let Some(text) = render::search(&state) {
                    println!("{text}");
                }
            }
            Ok(()) = details_rx.changed() => {
                let state = details_rx.borrow_and_update().clone();
                if let Some(text) = render::details(&shown_details, &state) {
                    println!("{text}");
                }
                shown_details = state;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    search.shutdown().await;
    details.shutdown().await;
    Ok(())
}
