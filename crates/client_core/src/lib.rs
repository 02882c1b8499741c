//! Client-side plumbing for the movie search front end.
//!
//! [`QueryController`] owns the "one current fetch per key" lifecycle; a
//! [`Fetcher`] supplies the network side. [`OmdbClient`] is the production
//! fetcher backed by `reqwest`.

pub mod controller;
pub mod fetcher;
pub mod omdb;
pub mod state;

pub use controller::{AttemptId, ControllerOptions, KeyChange, QueryController};
pub use fetcher::Fetcher;
pub use omdb::{MovieDetailsFetch, MovieSearch, OmdbClient, DEFAULT_OMDB_URL};
pub use state::ResultState;

pub use shared::{
    domain::{ImdbId, MovieDetails, MovieSummary, QueryKey},
    error::FetchError,
};
