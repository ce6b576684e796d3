use async_trait::async_trait;
use boardwatch_core::{BoardError, Post};
use std::sync::Arc;

pub mod ptt;
pub mod rate_limiter;
pub mod walker;

#[cfg(test)]
mod tests;

pub use ptt::PttBoardSource;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use walker::{PageHandle, PageStep, PageWalker, WalkedPage};

/// Opaque pagination token pointing at an older listing page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One listing page as returned by a board source.
#[derive(Debug, Clone, Default)]
pub struct BoardPage {
    /// Newest first. `content` may still be empty; see [`BoardSource::fetch_content`].
    pub posts: Vec<Post>,
    /// Token for the next older page; `None` when this is the oldest page
    pub previous: Option<PageToken>,
}

/// Where board pages come from.
///
/// Implementations fetch and parse; they never retry.
#[async_trait]
pub trait BoardSource: Send + Sync {
    /// Fetch the page identified by `token`, or the board's current page when
    /// `token` is `None`.
    async fn fetch_page(
        &self,
        board: &str,
        token: Option<&PageToken>,
    ) -> Result<BoardPage, BoardError>;

    /// Article body for a post taken from a listing page. Sources whose
    /// listings already carry the body return it as is.
    async fn fetch_content(&self, post: &Post) -> Result<String, BoardError> {
        Ok(post.content.clone())
    }
}

#[async_trait]
impl<T: BoardSource + ?Sized> BoardSource for Arc<T> {
    async fn fetch_page(
        &self,
        board: &str,
        token: Option<&PageToken>,
    ) -> Result<BoardPage, BoardError> {
        (**self).fetch_page(board, token).await
    }

    async fn fetch_content(&self, post: &Post) -> Result<String, BoardError> {
        (**self).fetch_content(post).await
    }
}
