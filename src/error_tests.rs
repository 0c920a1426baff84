use super::*;
use anyhow::Context;

#[test]
fn messages_match_wire_text() {
    assert_eq!(IndexSetError::UserIdMustNotBeEmpty.to_string(), "userID must not be empty");
    assert_eq!(IndexSetError::UserIdMustBeEmpty.to_string(), "userID must be empty");
    let e = IndexSetError::invalid_name("a/../b", "'..' segment");
    assert_eq!(e.to_string(), "invalid object name 'a/../b': '..' segment");
}

#[test]
fn code_mapping() {
    assert_eq!(IndexSetError::UserIdMustNotBeEmpty.code_str(), "user_id_must_not_be_empty");
    assert_eq!(IndexSetError::UserIdMustBeEmpty.code_str(), "user_id_must_be_empty");
    assert_eq!(IndexSetError::invalid_name("x", "y").code_str(), "invalid_object_name");
}

#[test]
fn tenant_mismatch_classification() {
    assert!(IndexSetError::UserIdMustNotBeEmpty.is_tenant_mismatch());
    assert!(IndexSetError::UserIdMustBeEmpty.is_tenant_mismatch());
    assert!(!IndexSetError::invalid_name("x", "y").is_tenant_mismatch());
}

#[test]
fn find_in_walks_context_chain() {
    let err = anyhow::Error::new(IndexSetError::UserIdMustBeEmpty);
    assert_eq!(IndexSetError::find_in(&err), Some(&IndexSetError::UserIdMustBeEmpty));

    let wrapped: anyhow::Result<()> = Err(IndexSetError::UserIdMustNotBeEmpty).context("list_files");
    let wrapped = wrapped.unwrap_err();
    assert_eq!(IndexSetError::find_in(&wrapped), Some(&IndexSetError::UserIdMustNotBeEmpty));

    let other = anyhow::anyhow!("boom");
    assert!(IndexSetError::find_in(&other).is_none());
}
