//! Board source for PTT-style web boards (`/bbs/<board>/index.html`).
//!
//! Listing pages show posts oldest-first with a "‹ 上頁" link to the previous
//! (older) page; pinned posts sit below a `r-list-sep` divider.

use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::{BoardPage, BoardSource, PageToken};
use async_trait::async_trait;
use boardwatch_core::{BoardError, Post, PostReference};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const PREVIOUS_PAGE_LABEL: &str = "上頁";
const STRIPPED_BODY_CLASSES: [&str; 3] = ["article-metaline", "article-metaline-right", "push"];

/// One entry of a listing page, before its article body is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub reference: PostReference,
    pub push: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Newest first
    pub entries: Vec<ListingEntry>,
    pub previous: Option<Url>,
}

#[derive(Debug)]
pub struct PttBoardSource {
    http_client: Client,
    base_url: Url,
    rate_limiter: Arc<RateLimiter>,
}

impl PttBoardSource {
    pub fn new(
        base_url: &str,
        user_agent: &str,
        requests_per_minute: u32,
    ) -> Result<Self, BoardError> {
        let base_url = Url::parse(base_url).map_err(|e| BoardError::InvalidUrl {
            url: base_url.to_string(),
            details: e.to_string(),
        })?;

        // Age-gated boards redirect to a consent page without this cookie
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("over18=1"));

        let http_client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BoardError::Transport {
                url: base_url.to_string(),
                source: e,
            })?;

        Ok(Self {
            http_client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::new(RateLimitConfig::per_minute(
                requests_per_minute,
            ))),
        })
    }

    pub fn index_url(&self, board: &str) -> Result<Url, BoardError> {
        self.base_url
            .join(&format!("bbs/{}/index.html", board))
            .map_err(|e| BoardError::InvalidUrl {
                url: format!("{}bbs/{}/index.html", self.base_url, board),
                details: e.to_string(),
            })
    }

    /// GET a page. `Ok(None)` means 404.
    async fn fetch_html(&self, url: &Url) -> Result<Option<String>, BoardError> {
        let _permit = self.rate_limiter.acquire_permit().await;
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BoardError::UnexpectedStatus {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl BoardSource for PttBoardSource {
    async fn fetch_page(
        &self,
        board: &str,
        token: Option<&PageToken>,
    ) -> Result<BoardPage, BoardError> {
        let url = match token {
            Some(token) => Url::parse(token.as_str()).map_err(|e| BoardError::InvalidUrl {
                url: token.as_str().to_string(),
                details: e.to_string(),
            })?,
            None => self.index_url(board)?,
        };

        let html = self
            .fetch_html(&url)
            .await?
            .ok_or_else(|| BoardError::BoardNotFound {
                board: board.to_string(),
            })?;
        let listing = parse_listing(&html, &url)?;
        info!(board, url = %url, posts = listing.entries.len(), "Parsed listing page");

        // Bodies are fetched later, only for posts the caller keeps
        let posts = listing
            .entries
            .into_iter()
            .map(|entry| Post {
                reference: entry.reference,
                push: entry.push,
                content: String::new(),
            })
            .collect();

        Ok(BoardPage {
            posts,
            previous: listing.previous.map(|u| PageToken::new(u.to_string())),
        })
    }

    async fn fetch_content(&self, post: &Post) -> Result<String, BoardError> {
        let url = Url::parse(post.url()).map_err(|e| BoardError::InvalidUrl {
            url: post.url().to_string(),
            details: e.to_string(),
        })?;

        match self.fetch_html(&url).await? {
            Some(html) => Ok(parse_article_body(&html)),
            None => {
                warn!(url = %url, "Article disappeared before it could be fetched");
                Ok(String::new())
            }
        }
    }
}

fn classify_transport_error(url: &Url, error: reqwest::Error) -> BoardError {
    if error.is_timeout() {
        BoardError::RequestTimeout {
            url: url.to_string(),
        }
    } else {
        BoardError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector should parse")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse a listing page into newest-first entries and the link to the older page.
pub fn parse_listing(html: &str, page_url: &Url) -> Result<ListingPage, BoardError> {
    let document = Html::parse_document(html);
    let container_selector = selector("div.r-list-container");
    let title_selector = selector("div.title a");
    let author_selector = selector("div.meta div.author");
    let date_selector = selector("div.meta div.date");
    let push_selector = selector("div.nrec");
    let paging_selector = selector("div.btn-group-paging a");

    let container = document
        .select(&container_selector)
        .next()
        .ok_or_else(|| BoardError::InvalidDocument {
            url: page_url.to_string(),
            details: "missing post list".to_string(),
        })?;

    let mut entries = Vec::new();
    for row in container.children().filter_map(ElementRef::wrap) {
        let classes: Vec<&str> = row.value().classes().collect();
        if classes.contains(&"r-list-sep") {
            // Everything below the divider is pinned
            break;
        }
        if !classes.contains(&"r-ent") {
            continue;
        }

        // Deleted posts keep their row but lose the link
        let Some(link) = row.select(&title_selector).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = page_url.join(href).map_err(|e| BoardError::InvalidUrl {
            url: href.to_string(),
            details: e.to_string(),
        })?;

        let author = row
            .select(&author_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let date = row
            .select(&date_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let push = row
            .select(&push_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        entries.push(ListingEntry {
            reference: PostReference {
                url: url.to_string(),
                title: element_text(link),
                author,
                date,
            },
            push,
        });
    }
    entries.reverse();

    let mut previous = None;
    for link in document.select(&paging_selector) {
        if !element_text(link).contains(PREVIOUS_PAGE_LABEL) {
            continue;
        }
        // On the oldest page the link is rendered disabled, without href
        if let Some(href) = link.value().attr("href") {
            previous = Some(page_url.join(href).map_err(|e| BoardError::InvalidUrl {
                url: href.to_string(),
                details: e.to_string(),
            })?);
        }
        break;
    }

    Ok(ListingPage { entries, previous })
}

/// Extract an article's body text, without the header lines and pushes.
pub fn parse_article_body(html: &str) -> String {
    let document = Html::parse_document(html);
    let main_selector = selector("#main-content");
    let Some(main) = document.select(&main_selector).next() else {
        return String::new();
    };

    let mut body = String::new();
    for child in main.children() {
        match child.value() {
            Node::Text(text) => body.push_str(text),
            Node::Element(element) => {
                if element
                    .classes()
                    .any(|class| STRIPPED_BODY_CLASSES.contains(&class))
                {
                    continue;
                }
                if let Some(element) = ElementRef::wrap(child) {
                    body.extend(element.text());
                }
            }
            _ => {}
        }
    }
    body.trim().to_string()
}
