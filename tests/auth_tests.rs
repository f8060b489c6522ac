use chatline::net::auth::{self, AuthError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

#[tokio::test]
async fn test_login_returns_session_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(
            serde_json::json!({"identifier": "alice", "password": "hunter2"}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session_token=abc-123; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = tokio_test::assert_ok!(auth::login(&mock_server.uri(), "alice", "hunter2").await);

    assert_eq!(token, "abc-123");
}

#[tokio::test]
async fn test_login_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .mount(&mock_server)
        .await;

    let result = auth::login(&mock_server.uri(), "alice", "wrong").await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_without_cookie() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let result = auth::login(&mock_server.uri(), "alice", "hunter2").await;

    assert!(matches!(result, Err(AuthError::MissingCookie)));
}

#[tokio::test]
async fn test_logout_sends_cookie() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("cookie", "session_token=abc-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    tokio_test::assert_ok!(auth::logout(&mock_server.uri(), "abc-123").await);
}

// ============================================================================
// Registration
// ============================================================================

fn registration() -> auth::Registration {
    auth::Registration {
        nickname: " alice ".to_string(),
        age: 30,
        gender: "female".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Liddell".to_string(),
        email: "alice@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn test_register_posts_full_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(serde_json::json!({
            "nickname": "alice",
            "age": 30,
            "gender": "female",
            "first_name": "Alice",
            "last_name": "Liddell",
            "email": "alice@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_string("User registered successfully"))
        .expect(1)
        .mount(&mock_server)
        .await;

    tokio_test::assert_ok!(auth::register(&mock_server.uri(), &registration()).await);
}

#[tokio::test]
async fn test_register_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Email or Nickname already taken"))
        .mount(&mock_server)
        .await;

    let result = auth::register(&mock_server.uri(), &registration()).await;
    assert!(matches!(result, Err(AuthError::AlreadyTaken)));
}

#[tokio::test]
async fn test_register_bad_request_and_local_validation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Missing required fields\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    match auth::register(&mock_server.uri(), &registration()).await {
        Err(AuthError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Missing required fields");
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    // Incomplete forms never reach the server (the mock expects one call)
    let incomplete = auth::Registration {
        email: String::new(),
        ..registration()
    };
    let result = auth::register(&mock_server.uri(), &incomplete).await;
    assert!(matches!(result, Err(AuthError::MissingFields)));
}
