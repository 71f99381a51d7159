//! Conference abstract explorer endpoints.
//!
//! # Endpoints
//!
//! - `GET /acr24` - Explorer page (summaries, search, embeddings plot)
//! - `POST /acr24/search` - Keyword search fragment (htmx)
//! - `GET /acr24/similar/:abstract_number` - Similar abstracts fragment
//!
//! Fragments answer with HTTP 200 even for unknown abstracts so htmx swaps
//! the message into the page.

use axum::{
    extract::{Path, State},
    response::Html,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::query::{KeywordQuery, QueryError, ResultLimit};
use crate::server::{AppState, ConferenceState, HttpError};
use crate::views;

/// Routes for the conference explorer.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/acr24", get(explorer))
        .route("/acr24/search", post(search))
        .route("/acr24/similar/:abstract_number", get(similar))
}

fn conference(state: &AppState) -> Result<&ConferenceState, HttpError> {
    state
        .conference
        .as_deref()
        .ok_or_else(|| HttpError::not_found("Conference explorer is disabled"))
}

async fn explorer(State(state): State<AppState>) -> Result<Html<String>, HttpError> {
    let conference = conference(&state)?;
    Ok(Html(views::conference::explorer(
        &state.site,
        &conference.data.summaries,
        &conference.data_url,
    )))
}

/// Form body of a search request.
#[derive(Debug, Deserialize)]
struct SearchForm {
    /// Search text
    #[serde(default)]
    q: String,

    /// `all`, or a number of results; anything else means the default
    #[serde(default)]
    limit: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Html<String>, HttpError> {
    let conference = conference(&state)?;

    if form.q.is_empty() {
        return Ok(Html(views::conference::message("Enter search terms above")));
    }

    let limit = form
        .limit
        .as_deref()
        .and_then(|l| l.parse::<ResultLimit>().ok())
        .unwrap_or_default();

    let query = KeywordQuery::new(form.q.as_str(), limit);
    let matches = conference.data.index.keyword_search(&query)?;
    debug!("Search '{}' matched {} abstracts", form.q, matches.total);

    Ok(Html(views::conference::search_results(&form.q, limit, &matches)))
}

async fn similar(
    State(state): State<AppState>,
    Path(abstract_number): Path<String>,
) -> Result<Html<String>, HttpError> {
    let conference = conference(&state)?;

    match conference
        .data
        .index
        .similar_to(&abstract_number, conference.similar_count)
    {
        Ok(similar) => Ok(Html(views::conference::similar_abstracts(&similar))),
        Err(QueryError::NotFound(_)) => {
            Ok(Html(views::conference::error_message("Abstract not found")))
        }
        Err(QueryError::MissingEmbedding(_)) => Ok(Html(views::conference::error_message(
            "No embedding is available for this abstract",
        ))),
        Err(e) => Err(e.into()),
    }
}
