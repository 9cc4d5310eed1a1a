// Tests for the SQLite crawl archive

mod common;

use trawl_core::data::{Database, SessionStatus, StoredNode};
use tempfile::TempDir;

fn create_test_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).unwrap();
    (temp_dir, db)
}

// ============================================================================
// Database Creation Tests
// ============================================================================

#[test]
fn test_database_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path);
    assert!(db.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_reopen_keeps_schema() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let session_id = {
        let db = Database::new(&db_path).unwrap();
        db.create_session("http://site.test/", None).unwrap()
    };

    let db = Database::new(&db_path).unwrap();
    assert!(db.get_session(&session_id).unwrap().is_some());
}

// ============================================================================
// Session Tests
// ============================================================================

#[test]
fn test_create_session() {
    let (_temp_dir, db) = create_test_db();

    let session_id = db
        .create_session("http://site.test/", Some(r#"{"max_depth":3}"#))
        .unwrap();
    assert!(!session_id.is_empty());

    let session = db.get_session(&session_id).unwrap().unwrap();
    assert_eq!(session.id, session_id);
    assert_eq!(session.status, "running");
    assert_eq!(session.seed_url, "http://site.test/");
    assert_eq!(session.configuration.as_deref(), Some(r#"{"max_depth":3}"#));
    assert!(session.end_time.is_none());
}

#[test]
fn test_session_ids_are_unique() {
    let (_temp_dir, db) = create_test_db();
    let first = db.create_session("http://site.test/", None).unwrap();
    let second = db.create_session("http://site.test/", None).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_finish_session() {
    let (_temp_dir, db) = create_test_db();
    let session_id = db.create_session("http://site.test/", None).unwrap();

    db.finish_session(&session_id, SessionStatus::Cancelled).unwrap();

    let session = db.get_session(&session_id).unwrap().unwrap();
    assert_eq!(session.status, "cancelled");
    assert!(session.end_time.is_some());
    assert!(session.end_time.unwrap() >= session.start_time);
}

#[test]
fn test_get_missing_session() {
    let (_temp_dir, db) = create_test_db();
    assert!(db.get_session("no-such-session").unwrap().is_none());
}

// ============================================================================
// Outcome Archive Tests
// ============================================================================

#[test]
fn test_insert_outcome_counts() {
    let (_temp_dir, db) = create_test_db();
    let session_id = db.create_session("http://site.test/", None).unwrap();
    let outcome = common::sample_outcome();

    let (nodes, edges) = db.insert_outcome(&session_id, &outcome).unwrap();
    assert_eq!(nodes, 4);
    assert_eq!(edges, 5);
}

#[test]
fn test_stored_nodes_carry_records() {
    let (_temp_dir, db) = create_test_db();
    let session_id = db.create_session("http://site.test/", None).unwrap();
    db.insert_outcome(&session_id, &common::sample_outcome()).unwrap();

    let nodes = db.get_nodes_by_session(&session_id).unwrap();
    assert_eq!(nodes.len(), 4);

    let json_page = nodes
        .iter()
        .find(|n| n.url == "http://site.test/b?page=2")
        .unwrap();
    assert_eq!(json_page.status_code, Some(200));
    assert_eq!(json_page.content_type.as_deref(), Some("application/json"));
    assert_eq!(json_page.depth, Some(1));

    let unfetched = nodes.iter().find(|n| n.url == "http://site.test/c").unwrap();
    assert_eq!(
        unfetched,
        &StoredNode {
            url: "http://site.test/c".to_string(),
            status_code: None,
            content_type: None,
            depth: None,
        }
    );
}

#[test]
fn test_stored_edges_match_graph() {
    let (_temp_dir, db) = create_test_db();
    let session_id = db.create_session("http://site.test/", None).unwrap();
    let outcome = common::sample_outcome();
    db.insert_outcome(&session_id, &outcome).unwrap();

    let stored = db.get_edges_by_session(&session_id).unwrap();
    let expected: Vec<(String, String)> = outcome
        .graph
        .edges()
        .into_iter()
        .map(|(s, t)| (s.to_string(), t.to_string()))
        .collect();
    assert_eq!(stored, expected);
}

#[test]
fn test_sessions_are_isolated() {
    let (_temp_dir, db) = create_test_db();
    let first = db.create_session("http://site.test/", None).unwrap();
    let second = db.create_session("http://down.test/", None).unwrap();

    db.insert_outcome(&first, &common::sample_outcome()).unwrap();
    db.insert_outcome(&second, &common::failed_seed_outcome()).unwrap();

    assert_eq!(db.get_nodes_by_session(&first).unwrap().len(), 4);
    assert_eq!(db.get_nodes_by_session(&second).unwrap().len(), 1);
    assert!(db.get_edges_by_session(&second).unwrap().is_empty());
}

#[test]
fn test_insert_outcome_twice_fails() {
    let (_temp_dir, db) = create_test_db();
    let session_id = db.create_session("http://site.test/", None).unwrap();
    let outcome = common::sample_outcome();

    db.insert_outcome(&session_id, &outcome).unwrap();
    assert!(db.insert_outcome(&session_id, &outcome).is_err());

    // The failed transaction left the first copy intact
    assert_eq!(db.get_nodes_by_session(&session_id).unwrap().len(), 4);
}
