#[cfg(test)]
mod tests {
    use crate::ptt::{parse_article_body, parse_listing, PttBoardSource};
    use crate::{BoardPage, BoardSource, PageStep, PageToken, PageWalker};
    use async_trait::async_trait;
    use boardwatch_core::{BoardError, Post, PostReference};
    use std::collections::HashMap;
    use std::sync::Arc;
    use url::Url;

    const LISTING_HTML: &str = r#"
<html><body>
<div class="action-bar">
  <div class="btn-group btn-group-paging">
    <a class="btn wide" href="/bbs/Test/index1.html">最舊</a>
    <a class="btn wide" href="/bbs/Test/index41.html">&lsaquo; 上頁</a>
    <a class="btn wide disabled">下頁 &rsaquo;</a>
    <a class="btn wide" href="/bbs/Test/index.html">最新</a>
  </div>
</div>
<div class="r-list-container action-bar-margin bbs-screen">
  <div class="r-ent">
    <div class="nrec"><span class="hl f2">3</span></div>
    <div class="title"><a href="/bbs/Test/M.100.A.AAA.html">[問題] oldest post</a></div>
    <div class="meta"><div class="author">alice</div><div class="date"> 1/02</div></div>
  </div>
  <div class="r-ent">
    <div class="nrec"></div>
    <div class="title">(本文已被刪除) [bob]</div>
    <div class="meta"><div class="author">-</div><div class="date"> 1/02</div></div>
  </div>
  <div class="r-ent">
    <div class="nrec"><span class="hl f3">爆</span></div>
    <div class="title"><a href="/bbs/Test/M.200.A.BBB.html">[心得] newest post</a></div>
    <div class="meta"><div class="author">carol</div><div class="date"> 1/03</div></div>
  </div>
  <div class="r-list-sep"></div>
  <div class="r-ent">
    <div class="nrec"></div>
    <div class="title"><a href="/bbs/Test/M.1.A.PIN.html">[公告] pinned rules</a></div>
    <div class="meta"><div class="author">mod</div><div class="date">12/31</div></div>
  </div>
</div>
</body></html>
"#;

    const OLDEST_PAGE_HTML: &str = r#"
<html><body>
<div class="btn-group btn-group-paging">
  <a class="btn wide disabled">最舊</a>
  <a class="btn wide disabled">&lsaquo; 上頁</a>
  <a class="btn wide" href="/bbs/Test/index2.html">下頁 &rsaquo;</a>
</div>
<div class="r-list-container action-bar-margin bbs-screen">
  <div class="r-ent">
    <div class="nrec"></div>
    <div class="title"><a href="/bbs/Test/M.1.A.FIRST.html">first ever</a></div>
    <div class="meta"><div class="author">founder</div><div class="date"> 1/01</div></div>
  </div>
</div>
</body></html>
"#;

    const ARTICLE_HTML: &str = r#"
<html><body>
<div id="main-content" class="bbs-screen bbs-content"><div class="article-metaline"><span class="article-meta-tag">作者</span><span class="article-meta-value">carol (Carol)</span></div><div class="article-metaline-right"><span class="article-meta-tag">看板</span><span class="article-meta-value">Test</span></div><div class="article-metaline"><span class="article-meta-tag">標題</span><span class="article-meta-value">[心得] newest post</span></div>
Hello board,
this is the <span class="hl">body</span>.
<div class="push"><span class="push-tag">推 </span><span class="push-userid">dave</span><span class="push-content">: nice</span></div></div>
</body></html>
"#;

    fn page_url() -> Url {
        Url::parse("https://www.ptt.cc/bbs/Test/index42.html").unwrap()
    }

    #[test]
    fn test_listing_is_newest_first_without_deleted_or_pinned() {
        let listing = parse_listing(LISTING_HTML, &page_url()).unwrap();

        let titles: Vec<&str> = listing
            .entries
            .iter()
            .map(|e| e.reference.title.as_str())
            .collect();
        assert_eq!(titles, vec!["[心得] newest post", "[問題] oldest post"]);

        let newest = &listing.entries[0];
        assert_eq!(
            newest.reference.url,
            "https://www.ptt.cc/bbs/Test/M.200.A.BBB.html"
        );
        assert_eq!(newest.reference.author, "carol");
        assert_eq!(newest.reference.date, "1/03");
        assert_eq!(newest.push, "爆");
    }

    #[test]
    fn test_listing_previous_link() {
        let listing = parse_listing(LISTING_HTML, &page_url()).unwrap();
        assert_eq!(
            listing.previous.unwrap().as_str(),
            "https://www.ptt.cc/bbs/Test/index41.html"
        );

        let oldest = parse_listing(OLDEST_PAGE_HTML, &page_url()).unwrap();
        assert!(oldest.previous.is_none());
        assert_eq!(oldest.entries.len(), 1);
    }

    #[test]
    fn test_listing_without_post_list_is_invalid() {
        let result = parse_listing("<html><body>over18?</body></html>", &page_url());
        assert!(matches!(result, Err(BoardError::InvalidDocument { .. })));
    }

    #[test]
    fn test_article_body_strips_header_and_pushes() {
        let body = parse_article_body(ARTICLE_HTML);
        assert!(body.starts_with("Hello board,"));
        assert!(body.contains("this is the body."));
        assert!(!body.contains("作者"));
        assert!(!body.contains("nice"));

        assert_eq!(parse_article_body("<html></html>"), "");
    }

    #[test]
    fn test_index_url() {
        let source = PttBoardSource::new("https://www.ptt.cc", "boardwatch-test/1.0", 60).unwrap();
        assert_eq!(
            source.index_url("Gossiping").unwrap().as_str(),
            "https://www.ptt.cc/bbs/Gossiping/index.html"
        );

        assert!(matches!(
            PttBoardSource::new("not a url", "boardwatch-test/1.0", 60),
            Err(BoardError::InvalidUrl { .. })
        ));
    }

    /// Serves fixed pages keyed by token; the current page uses the empty key.
    struct StaticSource {
        pages: HashMap<String, BoardPage>,
    }

    fn post(id: &str) -> Post {
        Post {
            reference: PostReference {
                url: id.to_string(),
                title: id.to_string(),
                author: "someone".to_string(),
                date: "1/01".to_string(),
            },
            push: String::new(),
            content: String::new(),
        }
    }

    #[async_trait]
    impl BoardSource for StaticSource {
        async fn fetch_page(
            &self,
            board: &str,
            token: Option<&PageToken>,
        ) -> Result<BoardPage, BoardError> {
            let key = token.map(|t| t.as_str()).unwrap_or("");
            self.pages
                .get(key)
                .cloned()
                .ok_or_else(|| BoardError::BoardNotFound {
                    board: board.to_string(),
                })
        }
    }

    #[tokio::test]
    async fn test_walker_reaches_end_of_board() {
        let mut pages = HashMap::new();
        pages.insert(
            String::new(),
            BoardPage {
                posts: vec![post("c"), post("b")],
                previous: Some(PageToken::new("p1")),
            },
        );
        pages.insert(
            "p1".to_string(),
            BoardPage {
                posts: vec![post("a")],
                previous: None,
            },
        );
        let walker = PageWalker::new(Arc::new(StaticSource { pages }));

        let current = walker.current_page("Test").await.unwrap();
        assert_eq!(current.handle.depth(), 0);
        assert_eq!(current.handle.board(), "Test");
        assert_eq!(current.posts.len(), 2);

        let older = match walker.previous_page(&current.handle).await.unwrap() {
            PageStep::Page(page) => page,
            PageStep::EndOfBoard => panic!("expected an older page"),
        };
        assert_eq!(older.handle.depth(), 1);
        assert_eq!(older.posts[0].url(), "a");
        assert!(!older.handle.has_previous());

        assert!(matches!(
            walker.previous_page(&older.handle).await.unwrap(),
            PageStep::EndOfBoard
        ));
    }

    #[test]
    fn test_walker_surfaces_fetch_errors() {
        let walker = PageWalker::new(Arc::new(StaticSource {
            pages: HashMap::new(),
        }));
        let result = tokio_test::block_on(walker.current_page("Missing"));
        assert!(matches!(result, Err(BoardError::BoardNotFound { .. })));
    }

    /// Listing without bodies; bodies come from `fetch_content`.
    struct ListingOnlySource {
        fetched: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BoardSource for ListingOnlySource {
        async fn fetch_page(
            &self,
            _board: &str,
            _token: Option<&PageToken>,
        ) -> Result<BoardPage, BoardError> {
            Ok(BoardPage {
                posts: vec![post("b"), post("a")],
                previous: None,
            })
        }

        async fn fetch_content(&self, post: &Post) -> Result<String, BoardError> {
            self.fetched.lock().unwrap().push(post.url().to_string());
            if post.url() == "broken" {
                return Err(BoardError::RequestTimeout {
                    url: post.url().to_string(),
                });
            }
            Ok(format!("body of {}", post.url()))
        }
    }

    #[tokio::test]
    async fn test_walker_fills_content_only_for_given_posts() {
        let source = Arc::new(ListingOnlySource {
            fetched: std::sync::Mutex::new(Vec::new()),
        });
        let walker = PageWalker::new(source.clone());

        let page = walker.current_page("Test").await.unwrap();
        assert!(page.posts.iter().all(|p| p.content.is_empty()));
        assert!(source.fetched.lock().unwrap().is_empty());

        let mut kept = page.posts[..1].to_vec();
        walker.fill_content(&mut kept).await.unwrap();
        assert_eq!(kept[0].content, "body of b");
        assert_eq!(*source.fetched.lock().unwrap(), vec!["b".to_string()]);

        let mut failing = vec![post("broken"), post("a")];
        let result = walker.fill_content(&mut failing).await;
        assert!(matches!(result, Err(BoardError::RequestTimeout { .. })));
    }

    #[tokio::test]
    async fn test_default_content_is_the_listing_body() {
        let mut with_body = post("a");
        with_body.content = "already here".to_string();
        let source = StaticSource {
            pages: HashMap::new(),
        };
        assert_eq!(
            source.fetch_content(&with_body).await.unwrap(),
            "already here"
        );
    }
}
