use axum::http::StatusCode;
use axum_test::TestServer;
use keeper::api::create_router;
use keeper::config::Config;
use keeper::models::*;
use keeper::store::VersionedStore;
use serde_json::json;

fn setup() -> (TestServer, VersionedStore, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    let store = VersionedStore::open(Config::with_home(tmp.path().join("projects")))
        .expect("Failed to open store");
    let app = create_router(store.clone());
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, store, tmp)
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn lists_commands_in_order() {
        let (server, _store, _tmp) = setup();

        let response = server.get("/api/v1/commands").await;

        response.assert_status_ok();
        let commands: Vec<CommandInfo> = response.json();
        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["list", "initialize", "files", "read", "write", "move", "remove", "test"]
        );
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (server, _store, _tmp) = setup();

        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn initializes_and_writes() {
        let (server, store, _tmp) = setup();

        let response = server
            .post("/api/v1/commands/initialize")
            .json(&json!({ "attributes": { "project": "web" } }))
            .await;
        response.assert_status_ok();
        assert!(response.text().ends_with("Project created."));

        let response = server
            .post("/api/v1/commands/write")
            .json(&json!({
                "attributes": { "project": "web", "file": "index.html" },
                "body": "<h1>hi</h1>"
            }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.text(), "File written.");
        assert_eq!(store.read_file("web", "index.html").unwrap(), "<h1>hi</h1>");
    }

    #[tokio::test]
    async fn returns_raw_file_content() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();
        store.write_file("web", "a.txt", "line 1\nline 2").unwrap();

        let response = server
            .post("/api/v1/commands/read")
            .json(&json!({ "attributes": { "project": "web", "file": "a.txt" } }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "line 1\nline 2");
    }

    #[tokio::test]
    async fn rejects_invalid_attributes() {
        let (server, _store, _tmp) = setup();

        let response = server
            .post("/api/v1/commands/read")
            .json(&json!({ "attributes": { "project": "web" } }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unknown_commands() {
        let (server, _store, _tmp) = setup();

        let response = server
            .post("/api/v1/commands/destroy")
            .json(&json!({ "attributes": {} }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_path_escapes() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();

        let response = server
            .post("/api/v1/commands/write")
            .json(&json!({
                "attributes": { "project": "web", "file": "../../escape.txt" },
                "body": "x"
            }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!store.root().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn reports_missing_files_as_not_found() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();

        let response = server
            .post("/api/v1/commands/read")
            .json(&json!({ "attributes": { "project": "web", "file": "nope.txt" } }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_listing_a_regular_file() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();
        store.write_file("web", "a.txt", "x").unwrap();

        let response = server
            .post("/api/v1/commands/files")
            .json(&json!({ "attributes": { "project": "web", "directory": "a.txt" } }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_reading_binary_content() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();
        std::fs::write(store.root().join("web/logo.bin"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let response = server
            .post("/api/v1/commands/read")
            .json(&json!({ "attributes": { "project": "web", "file": "logo.bin" } }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_reading_a_directory() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();
        store.write_file("web", "src/a.txt", "x").unwrap();

        let response = server
            .post("/api/v1/commands/read")
            .json(&json!({ "attributes": { "project": "web", "file": "src" } }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reports_existing_projects_as_conflict() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();

        let response = server
            .post("/api/v1/commands/initialize")
            .json(&json!({ "attributes": { "project": "web" } }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }
}

mod history {
    use super::*;

    #[tokio::test]
    async fn lists_commits_newest_first() {
        let (server, store, _tmp) = setup();
        store.initialize("web").unwrap();
        store.write_file("web", "a.txt", "x").unwrap();

        let response = server.get("/api/v1/projects/web/history").await;

        response.assert_status_ok();
        let commits: Vec<CommitSummary> = response.json();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message, "Write a.txt");
        assert_eq!(commits[1].message, "Initialize web");
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let (server, _store, _tmp) = setup();

        let response = server
            .get("/api/v1/projects/ghost/history")
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
