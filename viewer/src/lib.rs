//! Read-only browsing of the article archive, plus deletion.

use archive::ResultStore;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use boardwatch_core::{ArchiveError, ErrorExt};
use serde::Deserialize;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

pub mod html;


#[derive(Clone)]
pub struct ViewerState {
    pub results: ResultStore,
}

#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    pub title: String,
}

/// An archive failure rendered as an HTML error page.
#[derive(Debug)]
pub struct ViewerError(pub ArchiveError);

impl From<ArchiveError> for ViewerError {
    fn from(error: ArchiveError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ViewerError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ArchiveError::NotFound { .. } => StatusCode::NOT_FOUND,
            ArchiveError::InvalidName { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            self.0.log_error();
        } else {
            self.0.log_warn();
        }
        let body = html::render_error(&self.0.user_friendly_message());
        (status, Html(body)).into_response()
    }
}

pub fn router(results: ResultStore) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/view", get(view_article))
        .route("/delete", get(delete_article))
        .with_state(ViewerState { results })
}

/// Serve the viewer until `shutdown` completes.
pub async fn serve<F>(
    listener: TcpListener,
    results: ResultStore,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Viewer listening");
    }
    axum::serve(listener, router(results))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index(State(state): State<ViewerState>) -> Result<Html<String>, ViewerError> {
    let entries = state.results.list().await?;
    Ok(Html(html::render_index(&entries)))
}

async fn view_article(
    State(state): State<ViewerState>,
    Query(query): Query<ArticleQuery>,
) -> Result<Html<String>, ViewerError> {
    let article = state.results.read(&query.title).await?;
    Ok(Html(html::render_article(&query.title, &article)))
}

async fn delete_article(
    State(state): State<ViewerState>,
    Query(query): Query<ArticleQuery>,
) -> Result<Redirect, ViewerError> {
    state.results.delete(&query.title).await?;
    Ok(Redirect::to("/"))
}
