use archive::CursorStore;
use board_client::{PageStep, PageWalker, WalkedPage};
use boardwatch_core::{CoreError, Cursor, CursorError, Post};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_CURSOR_DEPTH: usize = 20;

/// Posts newer than the board's cursor, as found by one walk.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Newest first
    pub posts: Vec<Post>,
    pub pages_visited: usize,
    pub bootstrap: bool,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Walks a board back from its current page until it meets a post the
/// cursor has already seen, then moves the cursor forward.
#[derive(Clone)]
pub struct IncrementalCollector {
    walker: PageWalker,
    cursors: CursorStore,
    page_delay: Duration,
    cursor_depth: usize,
}

impl IncrementalCollector {
    pub fn new(walker: PageWalker, cursors: CursorStore) -> Self {
        Self {
            walker,
            cursors,
            page_delay: DEFAULT_PAGE_DELAY,
            cursor_depth: DEFAULT_CURSOR_DEPTH,
        }
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    pub fn with_cursor_depth(mut self, cursor_depth: usize) -> Self {
        self.cursor_depth = cursor_depth.max(1);
        self
    }

    pub fn cursors(&self) -> &CursorStore {
        &self.cursors
    }

    /// Collect the board's new posts and record them in its cursor.
    ///
    /// On any error the cursor is left as it was, so the next run walks the
    /// same range again.
    pub async fn collect(
        &self,
        board: &str,
        cancel: &CancellationToken,
    ) -> Result<Collection, CoreError> {
        let cursor = match self.cursors.load(board).await {
            Ok(cursor) if !cursor.is_empty() => cursor,
            Ok(_) | Err(CursorError::NotFound { .. }) => return self.bootstrap(board).await,
            Err(e) => return Err(e.into()),
        };

        let WalkedPage {
            posts,
            mut handle,
        } = self.walker.current_page(board).await?;
        let mut page_posts = posts;
        let mut fresh = Vec::new();
        let mut pages_visited = 1;

        loop {
            let mut seen = false;
            for post in page_posts {
                if cursor.contains(post.url()) {
                    seen = true;
                    break;
                }
                fresh.push(post);
            }
            if seen {
                debug!(board, pages_visited, "Reached previously seen post");
                break;
            }
            if !handle.has_previous() {
                debug!(board, pages_visited, "Reached end of board before any seen post");
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(CoreError::Cancelled {
                        operation: format!("walk of board {}", board),
                    });
                }
                _ = tokio::time::sleep(self.page_delay) => {}
            }

            match self.walker.previous_page(&handle).await? {
                PageStep::Page(page) => {
                    page_posts = page.posts;
                    handle = page.handle;
                    pages_visited += 1;
                }
                PageStep::EndOfBoard => break,
            }
        }

        if !fresh.is_empty() {
            self.walker.fill_content(&mut fresh).await?;
            self.advance_cursor(board, &cursor, &fresh).await?;
        }
        info!(board, new_posts = fresh.len(), pages_visited, "Collected board");
        Ok(Collection {
            posts: fresh,
            pages_visited,
            bootstrap: false,
        })
    }

    /// First crawl of a board: everything on the current page is new.
    async fn bootstrap(&self, board: &str) -> Result<Collection, CoreError> {
        let mut page = self.walker.current_page(board).await?;
        if !page.posts.is_empty() {
            self.walker.fill_content(&mut page.posts).await?;
            self.advance_cursor(board, &Cursor::default(), &page.posts)
                .await?;
        }
        info!(board, new_posts = page.posts.len(), "Bootstrapped board without a cursor");
        Ok(Collection {
            posts: page.posts,
            pages_visited: 1,
            bootstrap: true,
        })
    }

    async fn advance_cursor(
        &self,
        board: &str,
        previous: &Cursor,
        fresh: &[Post],
    ) -> Result<(), CoreError> {
        let cursor = previous.advance(fresh, self.cursor_depth);
        self.cursors.save(board, &cursor).await?;
        Ok(())
    }
}
