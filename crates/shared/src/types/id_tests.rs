use super::*;
use uuid::Uuid;

#[test]
fn test_fresh_keys_differ() {
    assert_ne!(CategoryId::new(), CategoryId::new());
}

#[test]
fn test_wraps_stored_uuid() {
    let uuid = Uuid::new_v4();
    let key = BudgetId::from_uuid(uuid);

    assert_eq!(key.into_inner(), uuid);
    assert_eq!(Uuid::from(key), uuid);
    assert_eq!(key.to_string(), uuid.to_string());
}

#[test]
fn test_serializes_as_bare_uuid() {
    let uuid = Uuid::new_v4();
    let json = serde_json::to_string(&CategoryId::from_uuid(uuid)).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));

    let back: CategoryId = serde_json::from_str(&json).unwrap();
    assert_eq!(back.into_inner(), uuid);
}
