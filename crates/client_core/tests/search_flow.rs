use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use client_core::{
    ControllerOptions, ImdbId, KeyChange, MovieDetailsFetch, MovieSearch, OmdbClient,
    QueryController, ResultState,
};
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, sync::watch};

#[derive(Debug, Deserialize)]
struct OmdbQuery {
    s: Option<String>,
    i: Option<String>,
}

#[derive(Clone, Default)]
struct Hits {
    total: Arc<AtomicUsize>,
}

async fn handle(State(hits): State<Hits>, Query(query): Query<OmdbQuery>) -> impl IntoResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    if let Some(id) = query.i {
        return Json(json!({
            "Title": "Interstellar",
            "Year": "2014",
            "Runtime": "169 min",
            "imdbRating": "8.7",
            "imdbID": id,
            "Response": "True"
        }));
    }

    let title = query.s.unwrap_or_default();
    if title == "batman" {
        // Long enough that the test always supersedes it first.
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    Json(json!({
        "Search": [{"Title": title, "Year": "2001", "imdbID": format!("tt-{title}"), "Poster": "N/A"}],
        "totalResults": "1",
        "Response": "True"
    }))
}

async fn spawn_server() -> (OmdbClient, Hits) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let hits = Hits::default();
    let app = Router::new()
        .route("/", get(handle))
        .with_state(hits.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (OmdbClient::new(format!("http://{addr}"), "integration"), hits)
}

async fn next_settled<T: Clone>(rx: &mut watch::Receiver<ResultState<T>>) -> ResultState<T> {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| !s.is_loading()))
        .await
        .expect("settled in time")
        .expect("controller alive")
        .clone()
}

#[tokio::test]
async fn short_query_never_reaches_the_network() {
    let (client, hits) = spawn_server().await;
    let search = QueryController::new(
        Arc::new(MovieSearch::new(client)),
        ControllerOptions::new("search", 3),
    );

    assert_eq!(search.on_key_change("in").await, KeyChange::Cleared);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(search.state().is_idle());
    assert_eq!(hits.total.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn interstellar_loads_then_succeeds() {
    let (client, _hits) = spawn_server().await;
    let search = QueryController::new(
        Arc::new(MovieSearch::new(client)),
        ControllerOptions::new("search", 3),
    );
    let mut rx = search.subscribe();

    search.on_key_change("interstellar").await;
    assert!(search.state().is_loading());

    let state = next_settled(&mut rx).await;
    let movies = state.payload().expect("movies");
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].title, "interstellar");
}

#[tokio::test]
async fn only_the_latest_query_is_observed() {
    let (client, _hits) = spawn_server().await;
    let search = QueryController::new(
        Arc::new(MovieSearch::new(client)),
        ControllerOptions::new("search", 3),
    );
    let mut rx = search.subscribe();

    search.on_key_change("batman").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    search.on_key_change("superman").await;

    let state = next_settled(&mut rx).await;
    let movies = state.payload().expect("movies");
    assert_eq!(movies[0].title, "superman");

    // Nothing from the abandoned batman request can arrive later.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(search.state(), state);
}

#[tokio::test]
async fn search_change_closes_details() {
    let (client, _hits) = spawn_server().await;
    let details = QueryController::new(
        Arc::new(MovieDetailsFetch::new(client.clone())),
        ControllerOptions::new("details", 1),
    );
    let (close_tx, mut close_rx) = tokio::sync::mpsc::unbounded_channel();
    let search = QueryController::new(
        Arc::new(MovieSearch::new(client)),
        ControllerOptions::new("search", 3),
    )
    .with_key_change_hook(move |_| {
        let _ = close_tx.send(());
    });

    let mut details_rx = details.subscribe();
    details.on_key_change(ImdbId::from("tt0816692")).await;
    let state = next_settled(&mut details_rx).await;
    let movie = state.payload().expect("details");
    assert_eq!(movie.runtime_minutes(), Some(169));

    search.on_key_change("alien").await;
    close_rx.recv().await.expect("close signal");
    details.on_key_change("").await;
    assert!(details.state().is_idle());
}
