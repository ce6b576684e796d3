#[cfg(test)]
mod tests {
    use crate::{sanitize_file_stem, CursorStore, ResultStore};
    use boardwatch_core::{
        ArchiveError, Cursor, CursorError, ErrorReporter, ExtractedArticle, KeywordKind,
        PostReference,
    };
    use std::env;
    use std::path::PathBuf;

    fn setup_test_dir() -> PathBuf {
        let dir = env::temp_dir().join(format!("test_boardwatch_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("Failed to create test directory");
        dir
    }

    fn reference(id: &str) -> PostReference {
        PostReference {
            url: format!("https://www.ptt.cc/bbs/Test/M.{}.A.html", id),
            title: format!("[閒聊] post {}", id),
            author: "alice".to_string(),
            date: "1/01".to_string(),
        }
    }

    fn article(board: &str, title: &str) -> ExtractedArticle {
        ExtractedArticle {
            title: title.to_string(),
            url: "https://www.ptt.cc/bbs/Test/M.1.A.html".to_string(),
            author: "alice".to_string(),
            date: "1/01".to_string(),
            board: board.to_string(),
            keyword: "閒聊".to_string(),
            keyword_kind: KeywordKind::Title,
            content: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_cursor_is_not_found() {
        let store = CursorStore::new(setup_test_dir());
        let result = store.load("Test").await;
        assert!(matches!(result, Err(CursorError::NotFound { board }) if board == "Test"));
    }

    #[tokio::test]
    async fn test_cursor_save_and_load() {
        let dir = setup_test_dir();
        let store = CursorStore::new(&dir);
        let cursor = Cursor::new(vec![reference("2"), reference("1")]);

        store.save("Test", &cursor).await.unwrap();
        let loaded = store.load("Test").await.unwrap();
        assert_eq!(loaded, cursor);

        // Only the cursor itself is left behind, no temp files
        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Test.json".to_string()]);
    }

    #[tokio::test]
    async fn test_cursor_save_replaces_previous() {
        let store = CursorStore::new(setup_test_dir());
        store
            .save("Test", &Cursor::new(vec![reference("1")]))
            .await
            .unwrap();
        store
            .save("Test", &Cursor::new(vec![reference("3"), reference("2")]))
            .await
            .unwrap();

        let loaded = store.load("Test").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(!loaded.contains(&reference("1").url));
    }

    #[tokio::test]
    async fn test_blank_cursor_file_means_no_history() {
        let dir = setup_test_dir();
        std::fs::write(dir.join("Test.json"), "  \n").unwrap();
        let store = CursorStore::new(&dir);
        assert!(matches!(
            store.load("Test").await,
            Err(CursorError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_cursor_is_an_error() {
        let dir = setup_test_dir();
        std::fs::write(dir.join("Truncated.json"), r#"[{"url":"https://"#).unwrap();
        let single = serde_json::to_string(&reference("1")).unwrap();
        std::fs::write(dir.join("Single.json"), single).unwrap();
        let store = CursorStore::new(&dir);

        assert!(matches!(
            store.load("Truncated").await,
            Err(CursorError::Corrupt { .. })
        ));
        assert!(matches!(
            store.load("Single").await,
            Err(CursorError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_cursor_is_not_not_found() {
        let dir = setup_test_dir();
        // A directory where the cursor file should be cannot be read as a file
        std::fs::create_dir_all(dir.join("Test.json")).unwrap();
        let store = CursorStore::new(&dir);
        assert!(matches!(
            store.load("Test").await,
            Err(CursorError::Read { .. })
        ));
    }

    #[test]
    fn test_cursor_path_is_sanitized() {
        let store = CursorStore::new("/tmp/status");
        assert_eq!(
            store.cursor_path("../etc/passwd"),
            PathBuf::from("/tmp/status/_etc_passwd.json")
        );
        assert_eq!(sanitize_file_stem(".."), "_");
        assert_eq!(sanitize_file_stem("[問卦] 有沒有/八卦"), "_問卦__有沒有_八卦");
    }

    #[tokio::test]
    async fn test_result_writes_are_byte_identical() {
        let store = ResultStore::new(setup_test_dir());
        let article = article("Test", "[閒聊] same title");

        let path = store.write(&article).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        let second_path = store.write(&article).await.unwrap();
        let second = std::fs::read(&second_path).unwrap();

        assert_eq!(path, second_path);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_result_key_includes_board() {
        let store = ResultStore::new(setup_test_dir());
        let a = store.write(&article("Gossiping", "same")).await.unwrap();
        let b = store.write(&article("Stock", "same")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_result_list_read_delete() {
        let dir = setup_test_dir();
        let store = ResultStore::new(&dir);
        std::fs::write(dir.join(".Test_x.json.tmp"), "partial").unwrap();
        std::fs::write(dir.join("notes.txt"), "not an article").unwrap();

        let written = article("Test", "[心得] hello");
        store.write(&written).await.unwrap();

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        let name = entries[0].name.clone();
        assert_eq!(name, ResultStore::file_name_for(&written));

        let read_back = store.read(&name).await.unwrap();
        assert_eq!(read_back, written);

        store.delete(&name).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(
            store.read(&name).await,
            Err(ArchiveError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&name).await,
            Err(ArchiveError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_result_names_cannot_escape_the_archive() {
        let store = ResultStore::new(setup_test_dir());
        for name in ["../config.json", "..", "", ".hidden.json", "a/b.json", "plain"] {
            assert!(matches!(
                store.read(name).await,
                Err(ArchiveError::InvalidName { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_list_of_missing_directory_is_empty() {
        let store = ResultStore::new(setup_test_dir().join("not-yet-created"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_all_isolates_failures() {
        let dir = setup_test_dir();
        let store = ResultStore::new(&dir);
        // Occupy one article's path with a directory so its rename fails
        let blocked = article("Test", "blocked");
        std::fs::create_dir_all(dir.join(ResultStore::file_name_for(&blocked))).unwrap();

        let articles = vec![article("Test", "first"), blocked, article("Test", "last")];
        let reporter = ErrorReporter::new().with_warning_reporting(false);
        let summary = store.write_all(&articles, &reporter).await;

        assert_eq!(summary.written, 2);
        assert_eq!(summary.failed, 1);
    }
}
