//! Plain-text rendering of controller state.

use std::fmt::Write as _;

use client_core::{MovieDetails, MovieSummary, ResultState};

pub fn search(state: &ResultState<Vec<MovieSummary>>) -> Option<String> {
    match state {
        ResultState::Idle => None,
        ResultState::Loading => Some("Loading...".to_string()),
        ResultState::Success(movies) => {
            let mut out = format!("Found {} results", movies.len());
            for movie in movies {
                let _ = write!(out, "\n  {} ({}) [{}]", movie.title, movie.year, movie.imdb_id);
            }
            Some(out)
        }
        ResultState::Failure(error) => Some(format!("error: {error}")),
    }
}

/// `previous` is the last rendered details state; closing only prints when
/// something was open.
pub fn details(
    previous: &ResultState<MovieDetails>,
    state: &ResultState<MovieDetails>,
) -> Option<String> {
    match state {
        ResultState::Idle if previous.is_idle() => None,
        ResultState::Idle => Some("(details closed)".to_string()),
        ResultState::Loading => Some("Loading details...".to_string()),
        ResultState::Success(movie) => Some(details_card(movie)),
        ResultState::Failure(error) => Some(format!("error: {error}")),
    }
}

fn details_card(movie: &MovieDetails) -> String {
    let mut out = format!("{} ({})", movie.title, movie.year);
    let runtime = movie
        .runtime_minutes()
        .map(|minutes| format!("{minutes} min"))
        .unwrap_or_else(|| "unknown runtime".to_string());
    let rating = movie
        .imdb_rating_value()
        .map(|rating| format!("{rating:.1} IMDb rating"))
        .unwrap_or_else(|| "unrated".to_string());
    let _ = write!(out, "\n  {} | {runtime} | {rating}", movie.released);
    for (label, value) in [
        ("Genre", &movie.genre),
        ("Director", &movie.director),
        ("Starring", &movie.actors),
        ("Plot", &movie.plot),
    ] {
        if !value.is_empty() {
            let _ = write!(out, "\n  {label}: {value}");
        }
    }
    out
}
