use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! key_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Length in characters, not bytes.
            pub fn char_len(&self) -> usize {
                self.0.chars().count()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

key_newtype!(QueryKey);
key_newtype!(ImdbId);

impl From<ImdbId> for QueryKey {
    fn from(value: ImdbId) -> Self {
        Self(value.0)
    }
}

impl From<&QueryKey> for ImdbId {
    fn from(value: &QueryKey) -> Self {
        Self(value.0.clone())
    }
}

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
    #[serde(rename = "imdbID")]
    pub imdb_id: ImdbId,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(rename = "imdbID")]
    pub imdb_id: ImdbId,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
    #[serde(rename = "Runtime", default)]
    pub runtime: String,
    #[serde(rename = "Plot", default)]
    pub plot: String,
    #[serde(rename = "Released", default)]
    pub released: String,
    #[serde(rename = "Actors", default)]
    pub actors: String,
    #[serde(rename = "Director", default)]
    pub director: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
}

impl MovieDetails {
    /// Parses `"148 min"` into `148`.
    pub fn runtime_minutes(&self) -> Option<u32> {
        if self.runtime == NOT_AVAILABLE {
            return None;
        }
        self.runtime.split_whitespace().next()?.parse().ok()
    }

    pub fn imdb_rating_value(&self) -> Option<f32> {
        if self.imdb_rating == NOT_AVAILABLE {
            return None;
        }
        self.imdb_rating.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(runtime: &str, rating: &str) -> MovieDetails {
        MovieDetails {
            imdb_id: ImdbId::from("tt0816692"),
            title: "Interstellar".to_string(),
            year: "2014".to_string(),
            poster: String::new(),
            runtime: runtime.to_string(),
            plot: String::new(),
            released: String::new(),
            actors: String::new(),
            director: String::new(),
            genre: String::new(),
            imdb_rating: rating.to_string(),
        }
    }

    #[test]
    fn query_key_length_counts_characters() {
        assert_eq!(QueryKey::from("amélie").char_len(), 6);
        assert_eq!(QueryKey::from("in").char_len(), 2);
    }

    #[test]
    fn parses_runtime_and_rating() {
        let movie = details("169 min", "8.7");
        assert_eq!(movie.runtime_minutes(), Some(169));
        assert_eq!(movie.imdb_rating_value(), Some(8.7));
    }

    #[test]
    fn not_available_fields_parse_to_none() {
        let movie = details("N/A", "N/A");
        assert_eq!(movie.runtime_minutes(), None);
        assert_eq!(movie.imdb_rating_value(), None);
    }
}
