use async_trait::async_trait;
use boardwatch_core::{ExtractedArticle, KeywordKind, Post, Rule};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Turns a shared post set into the articles it cares about.
///
/// Parsers only read the posts. They return a plain list: a post either
/// matches or it does not, there is no per-post failure to report.
#[async_trait]
pub trait PostParser: Send + Sync {
    fn label(&self) -> String;

    async fn parse_all(&self, board: &str, posts: &[Post]) -> Vec<ExtractedArticle>;
}

/// Case-insensitive substring match against one part of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordParser {
    kind: KeywordKind,
    keyword: String,
    needle: String,
}

impl KeywordParser {
    pub fn new(kind: KeywordKind, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into().trim().to_string();
        let needle = keyword.to_lowercase();
        Self {
            kind,
            keyword,
            needle,
        }
    }

    pub fn kind(&self) -> KeywordKind {
        self.kind
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn matches(&self, post: &Post) -> bool {
        let haystack = match self.kind {
            KeywordKind::Title => post.title(),
            KeywordKind::Author => post.author(),
            KeywordKind::Content => post.content.as_str(),
        };
        haystack.to_lowercase().contains(&self.needle)
    }
}

#[async_trait]
impl PostParser for KeywordParser {
    fn label(&self) -> String {
        format!("{}:{}", self.kind, self.keyword)
    }

    async fn parse_all(&self, board: &str, posts: &[Post]) -> Vec<ExtractedArticle> {
        posts
            .iter()
            .filter(|post| self.matches(post))
            .map(|post| ExtractedArticle::from_post(board, post, self.kind, &self.keyword))
            .collect()
    }
}

/// One parser per non-blank keyword of the rule, titles first.
pub fn parsers_for_rule(rule: &Rule) -> Vec<Arc<dyn PostParser>> {
    let groups = [
        (KeywordKind::Title, &rule.board_keywords),
        (KeywordKind::Author, &rule.author_keywords),
        (KeywordKind::Content, &rule.content_keywords),
    ];

    let mut parsers: Vec<Arc<dyn PostParser>> = Vec::new();
    for (kind, keywords) in groups {
        for keyword in keywords {
            if keyword.trim().is_empty() {
                continue;
            }
            parsers.push(Arc::new(KeywordParser::new(kind, keyword.as_str())));
        }
    }
    parsers
}

/// Run every parser concurrently over `posts` and concatenate what they return.
///
/// Waits until each parser has reported once. A parser task that dies without
/// reporting contributes nothing; the others are unaffected.
pub async fn fan_out(
    board: &str,
    parsers: Vec<Arc<dyn PostParser>>,
    posts: Arc<[Post]>,
) -> Vec<ExtractedArticle> {
    let expected = parsers.len();
    if expected == 0 || posts.is_empty() {
        return Vec::new();
    }

    let (result_tx, mut result_rx) = mpsc::channel(expected);
    for parser in parsers {
        let result_tx = result_tx.clone();
        let posts = Arc::clone(&posts);
        let board = board.to_string();
        tokio::spawn(async move {
            let label = parser.label();
            let articles = parser.parse_all(&board, &posts).await;
            debug!(board = %board, parser = %label, matched = articles.len(), "Parser finished");
            let _ = result_tx.send(articles).await;
        });
    }
    // Only the tasks hold senders now, so a dead task cannot stall the join
    drop(result_tx);

    let mut results = Vec::new();
    let mut reported = 0;
    while reported < expected {
        match result_rx.recv().await {
            Some(articles) => {
                results.extend(articles);
                reported += 1;
            }
            None => break,
        }
    }

    if reported < expected {
        warn!(
            board,
            missing = expected - reported,
            "Some parsers did not report results"
        );
    }
    results
}
