use chronicler_core::db::open_db_in_memory;
use chronicler_core::{RepoError, SqliteWorldRepository, World, WorldRepository};
use rusqlite::Connection;
use std::collections::BTreeMap;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    let world = World::with_id("world-aeldran", "Aeldran", 1337, 200, 120);
    let id = repo.create_world(&world, Some("gm-tara")).unwrap();

    let loaded = repo.get_world(&id).unwrap().unwrap();
    assert_eq!(loaded, world);
    assert!(loaded.environment.is_empty());
}

#[test]
fn get_missing_world_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    assert!(repo.get_world("no-such-world").unwrap().is_none());
}

#[test]
fn create_duplicate_id_returns_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    let world = World::with_id("world-dup", "First", 1, 10, 10);
    repo.create_world(&world, None).unwrap();

    let second = World::with_id("world-dup", "Second", 2, 20, 20);
    let err = repo.create_world(&second, None).unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "world", .. }));
}

#[test]
fn validation_failure_blocks_create_and_leaves_no_trace() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    let invalid = World::with_id("world-flat", "Flatland", 7, 0, 50);
    let err = repo.create_world(&invalid, None).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM worlds;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(audit_count(&conn), 0);
}

#[test]
fn create_appends_one_audit_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    let world = World::with_id("world-audit", "Audited", 42, 64, 64);
    repo.create_world(&world, Some("gm-tara")).unwrap();

    assert_eq!(audit_count(&conn), 1);
    let (action, actor, target, detail) = last_audit_row(&conn);
    assert_eq!(action, "world_created");
    assert_eq!(actor.as_deref(), Some("gm-tara"));
    assert_eq!(target.as_deref(), Some("world-audit"));
    let detail: serde_json::Value = serde_json::from_str(&detail.unwrap()).unwrap();
    assert_eq!(detail["name"], "Audited");
    assert_eq!(detail["seed"], 42);
}

#[test]
fn update_environment_merges_and_removes_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    let world = World::with_id("world-env", "Envland", 9, 30, 30);
    repo.create_world(&world, None).unwrap();

    let mut entries = BTreeMap::new();
    entries.insert("weather".to_string(), "rain".to_string());
    entries.insert("season".to_string(), "winter".to_string());
    let updated = repo.update_environment("world-env", &entries, None).unwrap();
    assert_eq!(updated.environment.get("weather").map(String::as_str), Some("rain"));
    assert_eq!(updated.environment.get("season").map(String::as_str), Some("winter"));
    assert!(updated.updated_at >= world.updated_at);

    let mut removal = BTreeMap::new();
    removal.insert("weather".to_string(), String::new());
    removal.insert("lighting".to_string(), "dim".to_string());
    let updated = repo.update_environment("world-env", &removal, None).unwrap();
    assert!(!updated.environment.contains_key("weather"));
    assert_eq!(updated.environment.get("season").map(String::as_str), Some("winter"));
    assert_eq!(updated.environment.get("lighting").map(String::as_str), Some("dim"));

    let actions = audit_actions(&conn);
    assert_eq!(
        actions,
        vec![
            "world_created".to_string(),
            "world_environment_updated".to_string(),
            "world_environment_updated".to_string(),
        ]
    );
}

#[test]
fn update_environment_missing_world_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    let mut entries = BTreeMap::new();
    entries.insert("weather".to_string(), "fog".to_string());
    let err = repo
        .update_environment("world-ghost", &entries, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "world", .. }));
    assert_eq!(audit_count(&conn), 0);
}

#[test]
fn list_worlds_is_sorted_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorldRepository::try_new(&conn).unwrap();

    repo.create_world(&World::with_id("w-2", "Zemuria", 1, 10, 10), None)
        .unwrap();
    repo.create_world(&World::with_id("w-1", "Aeldran", 2, 10, 10), None)
        .unwrap();

    let names: Vec<String> = repo
        .list_worlds()
        .unwrap()
        .into_iter()
        .map(|world| world.name)
        .collect();
    assert_eq!(names, vec!["Aeldran".to_string(), "Zemuria".to_string()]);
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteWorldRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

fn audit_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM audit_log;", [], |row| row.get(0))
        .unwrap()
}

fn audit_actions(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT action FROM audit_log ORDER BY id ASC;")
        .unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    rows.map(Result::unwrap).collect()
}

fn last_audit_row(conn: &Connection) -> (String, Option<String>, Option<String>, Option<String>) {
    conn.query_row(
        "SELECT action, actor_id, target_id, detail
         FROM audit_log
         ORDER BY id DESC
         LIMIT 1;",
        [],
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
            ))
        },
    )
    .unwrap()
}
