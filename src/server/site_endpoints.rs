//! Home, blog, post and project endpoints.
//!
//! # Endpoints
//!
//! - `GET /` - Home page
//! - `GET /blog` - Post listing, newest first
//! - `GET /post/:slug` - A single post
//! - `GET /projects` - Project listing
//! - `GET /:project_name` - Redirect a project short link to its site

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use tracing::debug;

use crate::server::{AppState, HttpError};
use crate::storage::StorageError;
use crate::views::{self, site::SimilarHook};

/// Routes for the personal site pages.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/blog", get(blog))
        .route("/projects", get(projects))
        .route("/post/:slug", get(post))
        .route("/:project_name", get(project_redirect))
}

async fn home(State(state): State<AppState>) -> Html<String> {
    Html(views::site::home(&state.site, state.conference_enabled()))
}

async fn blog(State(state): State<AppState>) -> Result<Html<String>, HttpError> {
    let posts = state.store.list_posts().await?;
    debug!("Listing {} posts", posts.len());
    Ok(Html(views::site::blog(
        &state.site,
        state.conference_enabled(),
        &posts,
    )))
}

async fn projects(State(state): State<AppState>) -> Result<Html<String>, HttpError> {
    let projects = state.store.projects().await?;
    Ok(Html(views::site::projects(
        &state.site,
        state.conference_enabled(),
        &projects,
    )))
}

/// Render a post.
///
/// When the conference explorer is on and an abstract shares the post's
/// slug, the page gets a "Find Similar Abstracts" button.
async fn post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, HttpError> {
    let mut content = match state.store.load_post(&slug).await {
        Ok(content) => content,
        Err(StorageError::NotFound(_)) => return Err(HttpError::not_found("Post not found")),
        Err(e) => return Err(e.into()),
    };
    content.rewrite_image_paths();

    let hook = state
        .conference
        .as_ref()
        .and_then(|c| c.data.index.find_by_slug(&slug))
        .map(|record| SimilarHook {
            abstract_number: &record.abstract_number,
        });

    Ok(Html(views::site::post(
        state.conference_enabled(),
        &content,
        hook,
    )))
}

/// Redirect a project short link to the project's external site.
async fn project_redirect(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
) -> Result<Redirect, HttpError> {
    match state.store.find_project(&project_name).await {
        Ok(project) => {
            debug!("Redirecting /{} to {}", project_name, project.external_link);
            Ok(Redirect::temporary(&project.external_link))
        }
        Err(StorageError::NotFound(_)) => Err(HttpError::not_found("Project not found")),
        Err(e) => Err(e.into()),
    }
}
