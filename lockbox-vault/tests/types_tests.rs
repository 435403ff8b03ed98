use chrono::{TimeZone, Utc};
use lockbox_vault::{Group, Owner, PrincipalId, SecretData, SecretRecord};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn owner_serializes_as_tagged_object() {
    let owner = Owner::Group("G".into());
    assert_eq!(
        serde_json::to_value(&owner).unwrap(),
        serde_json::json!({"type": "group", "id": "G"})
    );
    let user: Owner = serde_json::from_str(r#"{"type":"user","id":"u1"}"#).unwrap();
    assert_eq!(user, Owner::User("u1".into()));
}

#[test]
fn owner_principal() {
    assert_eq!(Owner::User("u1".into()).principal().as_str(), "u1");
    assert_eq!(Owner::Group("g1".into()).principal().as_str(), "group:g1");
    assert_eq!(Owner::Group("g1".into()).id(), "g1");
}

#[test]
fn principal_group_prefix() {
    let group = PrincipalId::group("abc");
    assert!(group.is_group());
    assert_eq!(group.group_id(), Some("abc"));
    assert_eq!(group.to_string(), "group:abc");

    let user = PrincipalId::user("abc");
    assert!(!user.is_group());
    assert_eq!(user.group_id(), None);
}

#[test]
fn group_prefix_is_reserved_for_users() {
    assert!(PrincipalId::is_reserved_user_id("group:g1"));
    assert!(!PrincipalId::is_reserved_user_id("alice"));
    assert!(!PrincipalId::is_reserved_user_id("my-group:g1"));
}

#[test]
fn secret_record_uses_camel_case_and_flat_envelope_map() {
    let mut keys = BTreeMap::new();
    keys.insert(PrincipalId::user("u1"), "AAAA".to_string());
    keys.insert(PrincipalId::group("g1"), "BBBB".to_string());
    let record = SecretRecord {
        id: "s1".into(),
        name: "Gmail".into(),
        owner: Owner::Group("g1".into()),
        encrypted_data: "CCCC".into(),
        encrypted_data_keys: keys,
        last_modified: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    };

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["encryptedData"], "CCCC");
    assert_eq!(value["encryptedDataKeys"]["group:g1"], "BBBB");
    assert_eq!(value["encryptedDataKeys"]["u1"], "AAAA");
    assert_eq!(value["owner"]["type"], "group");
    assert!(value.get("lastModified").is_some());

    let back: SecretRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
    assert_eq!(back.envelope_for(&PrincipalId::group("g1")), Some("BBBB"));
    assert_eq!(back.envelope_for(&PrincipalId::user("u2")), None);
}

#[test]
fn secret_data_omits_absent_optionals() {
    let data = SecretData {
        name: "n".into(),
        username: "u".into(),
        password: "p".into(),
        url: None,
        notes: None,
    };
    let json = serde_json::to_string(&data).unwrap();
    assert_eq!(json, r#"{"name":"n","username":"u","password":"p"}"#);
}

#[test]
fn secret_data_debug_redacts_password() {
    let data = SecretData {
        name: "Gmail".into(),
        username: "a@b.com".into(),
        password: "hunter2".into(),
        url: None,
        notes: Some("private".into()),
    };
    let debug = format!("{data:?}");
    assert!(!debug.contains("hunter2"));
    assert!(!debug.contains("private"));
    assert!(debug.contains("Gmail"));
}

#[test]
fn group_without_key_deserializes() {
    let group: Group =
        serde_json::from_str(r#"{"id":"g1","name":"Family","ownerId":"alice"}"#).unwrap();
    assert_eq!(group.group_public_key, None);
    assert!(group.member_ids.is_empty());
}
