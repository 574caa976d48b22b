use super::*;

// =============================================================================
// Wire decoding
// =============================================================================

#[test]
fn login_response_decodes_numeric_user_id() {
    let json = r#"{"success":true,"user":{"id":42,"full_name":"Ada","email":"ada@x.com","role":"admin"}}"#;
    let resp: LoginResponse = serde_json::from_str(json).unwrap();
    assert!(resp.success);
    let user = resp.user.unwrap();
    assert_eq!(user.id, "42");
    assert_eq!(user.name.as_deref(), Some("Ada"));
    assert_eq!(user.role.as_deref(), Some("admin"));
}

#[test]
fn login_response_failure_without_user() {
    let resp: LoginResponse = serde_json::from_str(r#"{"success":false,"error":"Invalid credentials"}"#).unwrap();
    assert!(!resp.success);
    assert!(resp.user.is_none());
    assert_eq!(resp.error.as_deref(), Some("Invalid credentials"));
}

#[test]
fn guest_grant_decodes_camel_case() {
    let grant: GuestSessionGrant =
        serde_json::from_str(r#"{"sessionId":"s-1","isAnonymous":true,"isLocalOnly":false}"#).unwrap();
    assert_eq!(grant.session_id, "s-1");
    assert!(grant.is_anonymous);
    assert_eq!(grant.is_local_only, Some(false));
}

#[test]
fn guest_grant_defaults_optional_fields() {
    let grant: GuestSessionGrant = serde_json::from_str(r#"{"sessionId":"s-2"}"#).unwrap();
    assert!(grant.is_anonymous);
    assert!(grant.is_local_only.is_none());
}

#[test]
fn feedback_record_accepts_bool_and_number_scalars() {
    let json = r#"{"id":7,"rating":4,"is_valid":true,"is_doable":false,"status":"pending"}"#;
    let rec: FeedbackRecord = serde_json::from_str(json).unwrap();
    assert_eq!(rec.id, "7");
    assert_eq!(rec.rating.as_deref(), Some("4"));
    assert_eq!(rec.is_valid.as_deref(), Some("yes"));
    assert_eq!(rec.is_doable.as_deref(), Some("no"));
    assert!(rec.admin_category.is_none());
}

#[test]
fn feedback_record_null_scalars_are_none() {
    let rec: FeedbackRecord = serde_json::from_str(r#"{"id":"a","is_valid":null}"#).unwrap();
    assert!(rec.is_valid.is_none());
}

#[test]
fn feedback_record_rejects_object_id() {
    assert!(serde_json::from_str::<FeedbackRecord>(r#"{"id":{"x":1}}"#).is_err());
}

// =============================================================================
// HttpBackend
// =============================================================================

#[test]
fn http_backend_trims_trailing_slash() {
    let backend = HttpBackend::new("http://backend.test/", Duration::from_secs(1)).unwrap();
    assert_eq!(backend.url("/api/auth/login"), "http://backend.test/api/auth/login");
}

#[test]
fn feedback_url_encodes_id_as_one_segment() {
    let backend = HttpBackend::new("http://backend.test/", Duration::from_secs(1)).unwrap();
    assert_eq!(backend.feedback_url("12").as_str(), "http://backend.test/api/feedback/12");
    assert_eq!(backend.feedback_url("1 2").path(), "/api/feedback/1%202");
    assert_eq!(backend.feedback_url("x/y?z").path(), "/api/feedback/x%2Fy%3Fz");
    assert_eq!(backend.feedback_url("x/y?z").query(), None);
    assert_ne!(backend.feedback_url("a.b"), backend.feedback_url("ab"));
}

#[test]
fn feedback_url_keeps_base_path_prefix() {
    let backend = HttpBackend::new("https://gw.test/litpath", Duration::from_secs(1)).unwrap();
    assert_eq!(backend.feedback_url("7").as_str(), "https://gw.test/litpath/api/feedback/7");
}

#[test]
fn http_backend_rejects_relative_base_url() {
    assert!(matches!(
        HttpBackend::new("backend.test", Duration::from_secs(1)),
        Err(BackendError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn http_backend_unreachable_is_network_error() {
    // Port 9 (discard) on localhost is not expected to accept HTTP.
    let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let err = backend.create_guest_session().await.unwrap_err();
    assert!(matches!(err, BackendError::Network(_)));
}
