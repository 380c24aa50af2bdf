//! Integration tests for the mirror
//!
//! These tests use wiremock to stand in for the remote REST API and run the
//! full stack against a SQLite file and a file checkpoint.

use async_trait::async_trait;
use serde_json::json;
use sitevision_mirror::api::{MarkupError, PagePayload, SiteVisionClient, TreeApi};
use sitevision_mirror::checkpoint::{CheckpointError, CheckpointStore, FileCheckpointStore};
use sitevision_mirror::config::{
    ApiConfig, CheckpointConfig, Config, CrawlerConfig, DatabaseConfig,
};
use sitevision_mirror::crawler::{run_mirror, CrawlOutcome, Crawler};
use sitevision_mirror::output::render_tree;
use sitevision_mirror::storage::{open_storage, Role, SqliteStorage, Storage, StorageError, Table};
use sitevision_mirror::{RemoteNodeRef, SyncError};
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/rest-api/1/0";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        api: ApiConfig {
            base_url: format!("{}{}/", server_uri, API_PATH),
            root_uri: "root".to_string(),
            username: None,
            password: None,
            timeout_secs: 5,
        },
        crawler: CrawlerConfig {
            properties_max_attempts: 2,
            properties_backoff_ms: 0,
            properties_backoff_max_ms: 0,
            ..CrawlerConfig::default()
        },
        checkpoint: CheckpointConfig {
            path: dir.join("files/checkpoint.json").display().to_string(),
        },
        database: DatabaseConfig {
            path: dir.join("mirror.db").display().to_string(),
            create_schema: true,
        },
    }
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", API_PATH, route)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn headless(server_uri: &str, id: &str, name: &str) -> serde_json::Value {
    json!({
        "properties": {
            "jcr:uuid": id,
            "displayName": name,
            "URI": format!("/{}", id),
            "URL": format!("{}/pages/{}", server_uri, id),
            "published": true,
            "creationDate": 1_600_000_000_000i64,
            "createdBy": {
                "id": "u1",
                "properties": {"displayName": "Ada", "mail": "ada@example.com"}
            }
        },
        "nodes": [],
        "contentNodes": []
    })
}

/// Mounts the tree root -> r(Home) -> [a(A) -> [c(C)], b(B), Page Content]
///
/// `b` has no headless payload and `c` has no reachable markup. Listing `r`
/// is expected exactly `r_listings` times.
async fn mount_tree(server: &MockServer, r_listings: u64) {
    let uri = server.uri();

    mount_json(server, "root/nodes", json!([{"id": "r", "name": "Home"}])).await;

    Mock::given(method("GET"))
        .and(path(format!("{}/r/nodes", API_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "name": "A"},
            {"id": "b", "name": "B"},
            {"id": "pc", "name": "Page Content"}
        ])))
        .expect(r_listings)
        .mount(server)
        .await;

    mount_json(server, "a/nodes", json!([{"id": "c", "name": "C"}])).await;

    Mock::given(method("GET"))
        .and(path(format!("{}/pc/nodes", API_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(server)
        .await;

    mount_json(server, "r/headless", headless(&uri, "r", "Home")).await;
    mount_json(server, "a/headless", headless(&uri, "a", "A")).await;
    mount_json(server, "c/headless", headless(&uri, "c", "C")).await;
    mount_json(
        server,
        "b/properties",
        json!({"jcr:uuid": "b", "displayName": "B", "createdBy": "u2"}),
    )
    .await;

    for page in ["r", "a"] {
        Mock::given(method("GET"))
            .and(path(format!("/pages/{}", page)))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<html>{}</html>", page)),
            )
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/pages/c"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

fn no_shutdown() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

fn stored_ids(storage: &SqliteStorage) -> Vec<String> {
    storage
        .list_pages()
        .unwrap()
        .into_iter()
        .map(|p| p.jcr_id)
        .collect()
}

/// Wraps the real client and requests a stop once `stop_on` is listed
struct StopAfter {
    inner: SiteVisionClient,
    stop_on: String,
    shutdown: watch::Sender<bool>,
}

#[async_trait]
impl TreeApi for StopAfter {
    async fn list_children(&self, node_id: &str) -> Vec<RemoteNodeRef> {
        if node_id == self.stop_on {
            self.shutdown.send(true).unwrap();
        }
        self.inner.list_children(node_id).await
    }

    async fn root_listing(&self) -> Vec<RemoteNodeRef> {
        self.inner.root_listing().await
    }

    async fn fetch_rendered(&self, node_id: &str) -> Option<PagePayload> {
        self.inner.fetch_rendered(node_id).await
    }

    async fn fetch_raw_properties(&self, node_id: &str) -> Option<PagePayload> {
        self.inner.fetch_raw_properties(node_id).await
    }

    async fn fetch_markup(&self, url: &str) -> Result<String, MarkupError> {
        self.inner.fetch_markup(url).await
    }
}

#[tokio::test]
async fn test_full_mirror() {
    let server = MockServer::start().await;
    mount_tree(&server, 1).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let report = run_mirror(&config, "hash", false, no_shutdown())
        .await
        .unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.stats.nodes_visited, 5);
    assert_eq!(report.stats.pages_persisted, 4);
    assert_eq!(report.stats.pages_without_markup, 2);
    assert_eq!(report.stats.nodes_skipped, 1);
    assert_eq!(report.stats.resolve_failures, 0);

    let storage = open_storage(Path::new(&config.database.path), false).unwrap();
    assert_eq!(stored_ids(&storage), vec!["r", "a", "c", "b"]);
    assert_eq!(
        render_tree(&storage).unwrap(),
        vec!["Home", "-A", "--C", "-B"]
    );

    let r = storage.get_page_by_jcr_id("r").unwrap().unwrap();
    assert!(r.is_root);
    assert_eq!(r.html.as_deref(), Some("<html>r</html>"));
    assert_eq!(r.creation_date.as_deref(), Some("2020-09-13 12:26:40"));

    let c = storage.get_page_by_jcr_id("c").unwrap().unwrap();
    assert!(c.html.is_none());
    assert_eq!(c.parent_name.as_deref(), Some("A"));

    let b = storage.get_page_by_jcr_id("b").unwrap().unwrap();
    assert!(b.html.is_none());
    assert!(b.page_object.contains("\"nodes\":[]"));

    let ada = storage.get_user_by_jcr_id("u1").unwrap().unwrap();
    assert_eq!(ada.mail.as_deref(), Some("ada@example.com"));
    let u2 = storage.get_user_by_jcr_id("u2").unwrap().unwrap();
    assert_eq!(u2.name, None);
    assert_eq!(
        storage.get_role_user(Role::CreatedBy, b.id).unwrap(),
        Some(u2.id)
    );

    assert_eq!(storage.count_rows(Table::Child).unwrap(), 3);
    assert_eq!(storage.count_rows(Table::CreatedBy).unwrap(), 4);

    // A finished walk leaves an empty checkpoint behind
    let checkpoint = FileCheckpointStore::new(&config.checkpoint.path);
    assert!(checkpoint.load().unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn test_interrupt_and_resume() {
    let server = MockServer::start().await;
    mount_tree(&server, 1).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    // First run stops after `a` is fully processed
    let (tx, rx) = watch::channel(false);
    let api = StopAfter {
        inner: SiteVisionClient::new(&config.api).unwrap(),
        stop_on: "a".to_string(),
        shutdown: tx,
    };
    let storage = open_storage(Path::new(&config.database.path), true).unwrap();
    let checkpoint = FileCheckpointStore::new(&config.checkpoint.path);
    let mut crawler =
        Crawler::new(api, storage, checkpoint, &config.crawler, "hash").with_shutdown(rx);

    assert_eq!(crawler.run().await.unwrap(), CrawlOutcome::Interrupted);
    assert_eq!(stored_ids(crawler.storage()), vec!["r", "a"]);
    drop(crawler);

    let saved = FileCheckpointStore::new(&config.checkpoint.path)
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(saved.remaining(), 3);
    assert_eq!(saved.frontier().last().unwrap().front().unwrap().id, "c");

    // Second run resumes without listing `r` again
    let report = run_mirror(&config, "hash", false, no_shutdown())
        .await
        .unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.stats.nodes_visited, 3);
    assert_eq!(report.stats.pages_persisted, 2);

    let storage = open_storage(Path::new(&config.database.path), false).unwrap();
    assert_eq!(stored_ids(&storage), vec!["r", "a", "c", "b"]);
    assert_eq!(storage.count_rows(Table::Page).unwrap(), 4);
    assert_eq!(storage.count_rows(Table::User).unwrap(), 2);

    let c = storage.get_page_by_jcr_id("c").unwrap().unwrap();
    assert_eq!(c.parent_id.as_deref(), Some("a"));
}

#[tokio::test]
async fn test_rerun_does_not_duplicate_rows() {
    let server = MockServer::start().await;
    mount_tree(&server, 2).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    run_mirror(&config, "hash", false, no_shutdown())
        .await
        .unwrap();
    run_mirror(&config, "hash", false, no_shutdown())
        .await
        .unwrap();

    let storage = open_storage(Path::new(&config.database.path), false).unwrap();
    assert_eq!(storage.count_rows(Table::Page).unwrap(), 4);
    assert_eq!(storage.count_rows(Table::User).unwrap(), 2);
    assert_eq!(storage.count_rows(Table::Child).unwrap(), 3);
    assert_eq!(storage.count_rows(Table::CreatedBy).unwrap(), 4);
}

#[tokio::test]
async fn test_corrupt_checkpoint_is_fatal_unless_fresh() {
    let server = MockServer::start().await;
    mount_tree(&server, 1).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    std::fs::create_dir_all(dir.path().join("files")).unwrap();
    std::fs::write(&config.checkpoint.path, "{\"frontier\": [[]]").unwrap();

    let result = run_mirror(&config, "hash", false, no_shutdown()).await;
    assert!(matches!(
        result,
        Err(SyncError::Checkpoint(CheckpointError::Corrupt { .. }))
    ));

    let report = run_mirror(&config, "hash", true, no_shutdown())
        .await
        .unwrap();
    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.stats.pages_persisted, 4);
}

#[tokio::test]
async fn test_missing_schema_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.database.create_schema = false;

    let result = run_mirror(&config, "hash", false, no_shutdown()).await;
    assert!(matches!(
        result,
        Err(SyncError::Storage(StorageError::NoTables))
    ));

    {
        let storage = SqliteStorage::new(Path::new(&config.database.path)).unwrap();
        drop(storage);
        let conn = rusqlite::Connection::open(&config.database.path).unwrap();
        conn.execute_batch("DROP TABLE published_by;").unwrap();
    }

    let result = run_mirror(&config, "hash", false, no_shutdown()).await;
    match result {
        Err(SyncError::Storage(StorageError::MissingTable(table))) => {
            assert_eq!(table, "published_by")
        }
        other => panic!("expected missing table, got {:?}", other.map(|r| r.outcome)),
    }
}

#[tokio::test]
async fn test_empty_root_listing_is_fatal() {
    let server = MockServer::start().await;
    mount_json(&server, "root/nodes", json!([])).await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let result = run_mirror(&config, "hash", false, no_shutdown()).await;

    assert!(matches!(result, Err(SyncError::EmptyRoot)));
    assert!(!Path::new(&config.checkpoint.path).exists());
}
