//! OMDb response envelopes.
//!
//! Every OMDb reply carries `"Response": "True" | "False"`; failures add an
//! `"Error"` string. Payload fields sit next to the flags at the top level.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{domain::MovieSummary, error::FetchError};

pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "Movie not found";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFlag {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseFlag {
    pub fn is_success(&self) -> bool {
        self.response.eq_ignore_ascii_case("true")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "Search", default)]
    pub search: Vec<MovieSummary>,
    #[serde(rename = "totalResults", default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<String>,
}

/// Splits a raw OMDb body into its payload, or a `NotFound` when the body
/// reports `"Response": "False"`. Bodies that fit neither shape are transport
/// errors.
pub fn decode_envelope<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, FetchError> {
    let flag: ResponseFlag = serde_json::from_value(body.clone())
        .map_err(|e| FetchError::transport(format!("malformed response: {e}")))?;

    if !flag.is_success() {
        let message = flag
            .error
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NOT_FOUND_MESSAGE.to_string());
        return Err(FetchError::not_found(message));
    }

    serde_json::from_value(body)
        .map_err(|e| FetchError::transport(format!("malformed response: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{ImdbId, MovieDetails};

    #[test]
    fn decodes_search_page() {
        let body = json!({
            "Search": [
                {"Title": "Interstellar", "Year": "2014", "imdbID": "tt0816692", "Type": "movie", "Poster": "N/A"}
            ],
            "totalResults": "1",
            "Response": "True"
        });

        let page: SearchPage = decode_envelope(body).expect("search page");
        assert_eq!(page.search.len(), 1);
        assert_eq!(page.search[0].imdb_id, ImdbId::from("tt0816692"));
        assert_eq!(page.total_results.as_deref(), Some("1"));
    }

    #[test]
    fn response_false_is_not_found_with_server_message() {
        let body = json!({"Response": "False", "Error": "Movie not found!"});
        let err = decode_envelope::<SearchPage>(body).expect_err("not found");
        assert_eq!(err, FetchError::NotFound("Movie not found!".to_string()));
    }

    #[test]
    fn response_false_without_message_uses_default() {
        let body = json!({"Response": "False"});
        let err = decode_envelope::<MovieDetails>(body).expect_err("not found");
        assert_eq!(err, FetchError::not_found("Movie not found"));
    }

    #[test]
    fn missing_flag_is_transport_error() {
        let err = decode_envelope::<SearchPage>(json!({"Search": []})).expect_err("malformed");
        assert!(matches!(err, FetchError::Transport(_)), "unexpected: {err:?}");
    }
}
