// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::IntoResponse;
use textbook_backend::error::ServiceError;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        ServiceError::UnsupportedLanguage("xx".to_string()),
        ServiceError::ConfigurationMissing("OpenRouter API key".to_string()),
        ServiceError::RemoteUnavailable("HTTP 500".to_string()),
        ServiceError::NotFound("profile".to_string()),
        ServiceError::InvalidRequest("Bad request".to_string()),
        ServiceError::Unauthorized("Invalid token".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_status_mapping() {
    let cases = vec![
        (ServiceError::UnsupportedLanguage("xx".into()), StatusCode::BAD_REQUEST),
        (ServiceError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
        (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
        (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (ServiceError::ConfigurationMissing("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        (ServiceError::RemoteUnavailable("x".into()), StatusCode::BAD_GATEWAY),
        (ServiceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected) in cases {
        assert_eq!(error.into_response().status(), expected);
    }
}

#[test]
fn test_kinds() {
    assert_eq!(ServiceError::UnsupportedLanguage("xx".into()).kind(), "unsupported_language");
    assert_eq!(ServiceError::ConfigurationMissing("k".into()).kind(), "configuration_missing");
    assert_eq!(ServiceError::RemoteUnavailable("x".into()).kind(), "remote_unavailable");
}

#[test]
fn test_remote_errors_are_collapsed() {
    let error = ServiceError::RemoteUnavailable("connect refused 10.0.0.3:443".to_string());
    assert!(error.is_remote());
    assert!(!ServiceError::NotFound("x".into()).is_remote());
}

#[tokio::test]
async fn test_remote_error_body_hides_transport_detail() {
    let response = ServiceError::RemoteUnavailable("connect refused 10.0.0.3:443".to_string())
        .into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "remote_unavailable");
    assert!(!body["error"]["message"].as_str().unwrap().contains("10.0.0.3"));
}

#[test]
fn test_unsupported_language_message() {
    let error = ServiceError::UnsupportedLanguage("xx".to_string());
    assert!(format!("{}", error).contains("xx"));
}
