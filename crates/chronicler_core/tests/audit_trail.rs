use chronicler_core::db::open_db_in_memory;
use chronicler_core::repo::audit_log;
use chronicler_core::{AuditEvent, RepoError};
use serde_json::json;

#[test]
fn append_assigns_increasing_ids_and_preserves_detail() {
    let conn = open_db_in_memory().unwrap();

    let first = audit_log::append(
        &conn,
        &AuditEvent {
            action: "world_created".to_string(),
            actor_id: Some("gm-tara".to_string()),
            target_id: Some("world-aeldran".to_string()),
            detail: Some(json!({ "name": "Aeldran" })),
        },
    )
    .unwrap();

    let second = audit_log::append(
        &conn,
        &AuditEvent {
            action: "region_created".to_string(),
            actor_id: None,
            target_id: Some("region-mistwood".to_string()),
            detail: None,
        },
    )
    .unwrap();

    assert!(second.id > first.id);

    let stored_detail: String = conn
        .query_row(
            "SELECT detail FROM audit_log WHERE id = ?1;",
            [first.id],
            |row| row.get(0),
        )
        .unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored_detail).unwrap();
    assert_eq!(stored["name"], "Aeldran");

    let stored_created_at: String = conn
        .query_row(
            "SELECT created_at FROM audit_log WHERE id = ?1;",
            [first.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored_created_at, first.created_at.to_rfc3339());
}

#[test]
fn append_rejects_blank_action() {
    let conn = open_db_in_memory().unwrap();

    let err = audit_log::append(
        &conn,
        &AuditEvent {
            action: "  ".to_string(),
            actor_id: None,
            target_id: None,
            detail: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM audit_log;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}
