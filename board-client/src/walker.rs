use crate::{BoardSource, PageToken};
use boardwatch_core::{BoardError, Post};
use std::sync::Arc;
use tracing::debug;

/// Position of a walk: which board, how deep, and how to go one page older.
#[derive(Debug, Clone)]
pub struct PageHandle {
    board: String,
    depth: usize,
    previous: Option<PageToken>,
}

impl PageHandle {
    pub fn board(&self) -> &str {
        &self.board
    }

    /// Zero for the current page, one for the page before it, and so on.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct WalkedPage {
    /// Newest first
    pub posts: Vec<Post>,
    pub handle: PageHandle,
}

#[derive(Debug, Clone)]
pub enum PageStep {
    Page(WalkedPage),
    EndOfBoard,
}

/// Walks a board from its current page towards older pages.
#[derive(Clone)]
pub struct PageWalker {
    source: Arc<dyn BoardSource>,
}

impl PageWalker {
    pub fn new(source: Arc<dyn BoardSource>) -> Self {
        Self { source }
    }

    pub async fn current_page(&self, board: &str) -> Result<WalkedPage, BoardError> {
        let page = self.source.fetch_page(board, None).await?;
        debug!(board, posts = page.posts.len(), "Fetched current page");
        Ok(WalkedPage {
            posts: page.posts,
            handle: PageHandle {
                board: board.to_string(),
                depth: 0,
                previous: page.previous,
            },
        })
    }

    pub async fn previous_page(&self, handle: &PageHandle) -> Result<PageStep, BoardError> {
        let Some(token) = handle.previous.as_ref() else {
            debug!(board = %handle.board, depth = handle.depth, "Reached end of board");
            return Ok(PageStep::EndOfBoard);
        };

        let page = self.source.fetch_page(&handle.board, Some(token)).await?;
        let depth = handle.depth + 1;
        debug!(board = %handle.board, depth, posts = page.posts.len(), "Fetched older page");
        Ok(PageStep::Page(WalkedPage {
            posts: page.posts,
            handle: PageHandle {
                board: handle.board.clone(),
                depth,
                previous: page.previous,
            },
        }))
    }

    /// Fetch the article bodies of `posts`, in order. The first failure
    /// stops the fill.
    pub async fn fill_content(&self, posts: &mut [Post]) -> Result<(), BoardError> {
        for post in posts.iter_mut() {
            let content = self.source.fetch_content(post).await?;
            post.content = content;
        }
        debug!(posts = posts.len(), "Fetched article bodies");
        Ok(())
    }
}
