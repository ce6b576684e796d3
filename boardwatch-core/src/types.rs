use serde::{Deserialize, Serialize};

/// One board to watch and the keywords to look for in its posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub board: String,
    #[serde(default, alias = "board_keyword")]
    pub board_keywords: Vec<String>,
    #[serde(default, alias = "author_keyword")]
    pub author_keywords: Vec<String>,
    #[serde(default, alias = "content_keyword")]
    pub content_keywords: Vec<String>,
}

impl Rule {
    pub fn new(board: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            board_keywords: Vec::new(),
            author_keywords: Vec::new(),
            content_keywords: Vec::new(),
        }
    }

    pub fn keyword_count(&self) -> usize {
        self.board_keywords.len() + self.author_keywords.len() + self.content_keywords.len()
    }

    /// Fold another rule for the same board into this one, keeping keyword order
    /// and dropping duplicates.
    pub fn absorb(&mut self, other: Rule) {
        debug_assert_eq!(self.board, other.board);
        merge_unique(&mut self.board_keywords, other.board_keywords);
        merge_unique(&mut self.author_keywords, other.author_keywords);
        merge_unique(&mut self.content_keywords, other.content_keywords);
    }
}

fn merge_unique(into: &mut Vec<String>, from: Vec<String>) {
    for keyword in from {
        if !into.contains(&keyword) {
            into.push(keyword);
        }
    }
}

/// Identity of a post as recorded in a board cursor. `url` is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReference {
    pub url: String,
    pub title: String,
    pub author: String,
    pub date: String,
}

/// A fetched post, held in memory for one cycle only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub reference: PostReference,
    pub push: String,
    pub content: String,
}

impl Post {
    pub fn url(&self) -> &str {
        &self.reference.url
    }

    pub fn title(&self) -> &str {
        &self.reference.title
    }

    pub fn author(&self) -> &str {
        &self.reference.author
    }
}

/// Which part of a post a keyword is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    Title,
    Author,
    Content,
}

impl std::fmt::Display for KeywordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywordKind::Title => write!(f, "title"),
            KeywordKind::Author => write!(f, "author"),
            KeywordKind::Content => write!(f, "content"),
        }
    }
}

/// A post that matched a keyword, as written to the archive.
///
/// Field order is the serialization order, so the same article always
/// produces the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub title: String,
    pub url: String,
    pub author: String,
    pub date: String,
    pub board: String,
    pub keyword: String,
    pub keyword_kind: KeywordKind,
    pub content: String,
}

impl ExtractedArticle {
    pub fn from_post(board: &str, post: &Post, kind: KeywordKind, keyword: &str) -> Self {
        Self {
            title: post.reference.title.clone(),
            url: post.reference.url.clone(),
            author: post.reference.author.clone(),
            date: post.reference.date.clone(),
            board: board.to_string(),
            keyword: keyword.to_string(),
            keyword_kind: kind,
            content: post.content.clone(),
        }
    }
}

/// Newest-first references recorded after the last successful crawl of a board.
///
/// Persisted as a bare JSON array of [`PostReference`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor {
    references: Vec<PostReference>,
}

impl Cursor {
    pub fn new(references: Vec<PostReference>) -> Self {
        Self { references }
    }

    /// Build a cursor from newest-first posts, keeping at most `depth` references.
    pub fn from_posts(posts: &[Post], depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            references: posts
                .iter()
                .take(depth)
                .map(|post| post.reference.clone())
                .collect(),
        }
    }

    /// Put newest-first `posts` in front of the remembered references, drop
    /// repeats and keep at most `depth`.
    ///
    /// Older references stay behind the new ones so a walk still stops when
    /// the newest posts are deleted from the board.
    pub fn advance(&self, posts: &[Post], depth: usize) -> Self {
        let depth = depth.max(1);
        let mut references: Vec<PostReference> = Vec::with_capacity(depth);
        let candidates = posts
            .iter()
            .map(|post| &post.reference)
            .chain(self.references.iter());
        for reference in candidates {
            if references.len() == depth {
                break;
            }
            if !references.iter().any(|r| r.url == reference.url) {
                references.push(reference.clone());
            }
        }
        Self { references }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.references.iter().any(|r| r.url == url)
    }

    pub fn newest(&self) -> Option<&PostReference> {
        self.references.first()
    }

    pub fn references(&self) -> &[PostReference] {
        &self.references
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str) -> Post {
        Post {
            reference: PostReference {
                url: format!("https://www.ptt.cc/bbs/Test/M.{}.A.html", id),
                title: format!("title {}", id),
                author: "author".to_string(),
                date: "1/01".to_string(),
            },
            push: String::new(),
            content: String::new(),
        }
    }

    #[test]
    fn test_rule_accepts_singular_keyword_fields() {
        let json = r#"{"board":"Gossiping","board_keyword":["[問卦]"],"author_keyword":[],"content_keyword":["貓"]}"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.board, "Gossiping");
        assert_eq!(rule.board_keywords, vec!["[問卦]".to_string()]);
        assert!(rule.author_keywords.is_empty());
        assert_eq!(rule.content_keywords, vec!["貓".to_string()]);
        assert_eq!(rule.keyword_count(), 2);
    }

    #[test]
    fn test_rule_missing_keyword_fields_default_to_empty() {
        let rule: Rule = serde_json::from_str(r#"{"board":"Test"}"#).unwrap();
        assert_eq!(rule.keyword_count(), 0);
    }

    #[test]
    fn test_rule_absorb_dedupes() {
        let mut a = Rule::new("Test");
        a.board_keywords = vec!["x".to_string(), "y".to_string()];
        let mut b = Rule::new("Test");
        b.board_keywords = vec!["y".to_string(), "z".to_string()];
        b.author_keywords = vec!["someone".to_string()];

        a.absorb(b);
        assert_eq!(a.board_keywords, vec!["x", "y", "z"]);
        assert_eq!(a.author_keywords, vec!["someone"]);
    }

    #[test]
    fn test_cursor_from_posts_respects_depth() {
        let posts = vec![post("3"), post("2"), post("1")];
        let cursor = Cursor::from_posts(&posts, 2);
        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor.newest().unwrap().url, posts[0].reference.url);
        assert!(cursor.contains(&posts[1].reference.url));
        assert!(!cursor.contains(&posts[2].reference.url));

        // Depth is never below one
        assert_eq!(Cursor::from_posts(&posts, 0).len(), 1);
    }

    #[test]
    fn test_cursor_advance_keeps_older_references() {
        let previous = Cursor::from_posts(&[post("2"), post("1")], 20);
        let advanced = previous.advance(&[post("3")], 20);
        let urls: Vec<&str> = advanced.references().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                post("3").reference.url.as_str(),
                post("2").reference.url.as_str(),
                post("1").reference.url.as_str(),
            ]
        );

        // Repeats are dropped and the depth still applies
        let trimmed = advanced.advance(&[post("4"), post("3")], 2);
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed.newest().unwrap().url, post("4").reference.url);
        assert!(trimmed.contains(&post("3").reference.url));
        assert!(!trimmed.contains(&post("2").reference.url));

        assert_eq!(Cursor::default().advance(&[post("1")], 0).len(), 1);
    }

    #[test]
    fn test_cursor_serializes_as_array() {
        let cursor = Cursor::from_posts(&[post("1")], 5);
        let json = serde_json::to_string(&cursor).unwrap();
        assert!(json.starts_with('['));

        let back: Cursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);

        // A single-object cursor is not the canonical schema
        let single = serde_json::to_string(&post("1").reference).unwrap();
        assert!(serde_json::from_str::<Cursor>(&single).is_err());
    }

    #[test]
    fn test_extracted_article_serialization_is_stable() {
        let article = ExtractedArticle::from_post("Test", &post("1"), KeywordKind::Title, "title");
        let first = serde_json::to_string_pretty(&article).unwrap();
        let second = serde_json::to_string_pretty(&article.clone()).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"keyword_kind\": \"title\""));
    }
}
