//! Register / login / principal flow tests against the in-memory store

#[cfg(test)]
mod use_case_tests {
    use std::sync::Arc;

    use kernel::id::UserId;

    use crate::application::config::IdentityConfig;
    use crate::application::principal_token;
    use crate::application::register::RegisterOutput;
    use crate::application::{LoginInput, LoginUseCase, MeUseCase, RegisterInput, RegisterUseCase};
    use crate::error::IdentityError;
    use crate::infra::memory::MemoryUserStore;

    fn config() -> Arc<IdentityConfig> {
        Arc::new(IdentityConfig::development())
    }

    fn input(user_name: &str, email: &str) -> RegisterInput {
        RegisterInput {
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: "river-stone-42".to_string(),
        }
    }

    async fn register(
        store: &Arc<MemoryUserStore>,
        config: &Arc<IdentityConfig>,
        user_name: &str,
        email: &str,
    ) -> Result<RegisterOutput, IdentityError> {
        RegisterUseCase::new(store.clone(), config.clone())
            .execute(input(user_name, email))
            .await
    }

    #[tokio::test]
    async fn test_register_issues_verifiable_token() {
        let store = Arc::new(MemoryUserStore::new());
        let config = config();

        let output = register(&store, &config, "Alice_01", "Alice@Example.com")
            .await
            .unwrap();

        assert_eq!(output.user.email.as_str(), "alice@example.com");
        assert_eq!(output.user.problems_solved, 0);
        assert_eq!(output.user.solutions_provided, 0);
        assert_eq!(
            principal_token::verify(&config, &output.token.token).unwrap(),
            output.user.user_id
        );
    }

    #[tokio::test]
    async fn test_register_conflicts_are_case_insensitive() {
        let store = Arc::new(MemoryUserStore::new());
        let config = config();
        register(&store, &config, "alice", "alice@example.com")
            .await
            .unwrap();

        let err = register(&store, &config, "ALICE", "other@example.com")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IdentityError::UserNameTaken));

        let err = register(&store, &config, "bob", "ALICE@example.com")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IdentityError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = Arc::new(MemoryUserStore::new());
        let config = config();

        let err = register(&store, &config, "a b", "x@example.com")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IdentityError::Validation(_)));

        let err = register(&store, &config, "carol", "not-an-email")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IdentityError::Validation(_)));

        let err = RegisterUseCase::new(store.clone(), config.clone())
            .execute(RegisterInput {
                user_name: "carol".to_string(),
                email: "carol@example.com".to_string(),
                password: "short".to_string(),
            })
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IdentityError::PasswordValidation(_)));
    }

    #[tokio::test]
    async fn test_login_success_and_uniform_failure() {
        let store = Arc::new(MemoryUserStore::new());
        let config = config();
        let registered = register(&store, &config, "dave", "dave@example.com")
            .await
            .unwrap();

        let login = LoginUseCase::new(store.clone(), config.clone());

        let output = login
            .execute(LoginInput {
                email: "DAVE@example.com".to_string(),
                password: "river-stone-42".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output.user.user_id, registered.user.user_id);

        let wrong_password = login
            .execute(LoginInput {
                email: "dave@example.com".to_string(),
                password: "river-stone-43".to_string(),
            })
            .await
            .err()
            .unwrap();
        let unknown_email = login
            .execute(LoginInput {
                email: "nobody@example.com".to_string(),
                password: "river-stone-42".to_string(),
            })
            .await
            .err()
            .unwrap();

        assert!(matches!(wrong_password, IdentityError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_pepper_is_applied() {
        let store = Arc::new(MemoryUserStore::new());
        let peppered = Arc::new(IdentityConfig {
            password_pepper: Some(b"pepper".to_vec()),
            ..IdentityConfig::development()
        });
        register(&store, &peppered, "erin", "erin@example.com")
            .await
            .unwrap();

        let login = |config: Arc<IdentityConfig>| {
            let store = store.clone();
            async move {
                LoginUseCase::new(store, config)
                    .execute(LoginInput {
                        email: "erin@example.com".to_string(),
                        password: "river-stone-42".to_string(),
                    })
                    .await
            }
        };

        assert!(login(peppered.clone()).await.is_ok());
        assert!(login(config()).await.is_err());
    }

    #[tokio::test]
    async fn test_me_unknown_user() {
        let store = Arc::new(MemoryUserStore::new());
        let err = MeUseCase::new(store).execute(UserId::new()).await.err().unwrap();
        assert!(matches!(err, IdentityError::UserNotFound));
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use axum::routing::get;
    use axum::{Json, Router, middleware};
    use http_body_util::BodyExt;
    use kernel::principal::Principal;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::config::IdentityConfig;
    use crate::infra::memory::MemoryUserStore;
    use crate::presentation::middleware::attach_principal;
    use crate::presentation::router::identity_router_generic;

    async fn whoami(principal: Option<Principal>) -> Json<Value> {
        Json(json!({ "userId": principal.map(|p| p.user_id.to_string()) }))
    }

    fn app(store: &MemoryUserStore, config: &Arc<IdentityConfig>) -> Router {
        identity_router_generic(store.clone(), config.clone())
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(config.clone(), attach_principal))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn register_body(username: &str, email: &str) -> Value {
        json!({ "username": username, "email": email, "password": "river-stone-42" })
    }

    #[tokio::test]
    async fn test_register_then_me_with_bearer() {
        let store = MemoryUserStore::new();
        let config = Arc::new(IdentityConfig::development());

        let response = app(&store, &config)
            .oneshot(json_request(
                "POST",
                "/auth/register",
                register_body("Frank", "frank@example.com"),
            ))
            .await
            .unwrap();
        assert!(response.headers().contains_key(header::SET_COOKIE));
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());
        assert_eq!(body["user"]["username"], "Frank");

        let token = body["token"].as_str().unwrap().to_string();
        let request = Request::builder()
            .uri("/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, me) = read(app(&store, &config).oneshot(request).await.unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["user"]["email"], "frank@example.com");
        assert_eq!(me["user"]["problemsSolved"], 0);
        assert_eq!(me["user"]["solutionsProvided"], 0);
    }

    #[tokio::test]
    async fn test_cookie_credential_attaches_principal() {
        let store = MemoryUserStore::new();
        let config = Arc::new(IdentityConfig::development());

        let response = app(&store, &config)
            .oneshot(json_request(
                "POST",
                "/auth/register",
                register_body("grace", "grace@example.com"),
            ))
            .await
            .unwrap();
        let (_, body) = read(response).await;
        let token = body["token"].as_str().unwrap();

        let request = Request::builder()
            .uri("/whoami")
            .header(header::COOKIE, format!("{}={}", config.cookie_name, token))
            .body(Body::empty())
            .unwrap();
        let (_, who) = read(app(&store, &config).oneshot(request).await.unwrap()).await;
        assert_eq!(who["userId"], body["user"]["id"]);
    }

    #[tokio::test]
    async fn test_invalid_token_stays_anonymous() {
        let store = MemoryUserStore::new();
        let config = Arc::new(IdentityConfig::development());

        let request = Request::builder()
            .uri("/whoami")
            .header(header::AUTHORIZATION, "Bearer forged.token.value")
            .body(Body::empty())
            .unwrap();
        let (status, who) = read(app(&store, &config).oneshot(request).await.unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(who["userId"], Value::Null);

        let request = Request::builder().uri("/auth/me").body(Body::empty()).unwrap();
        let (status, body) = read(app(&store, &config).oneshot(request).await.unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_duplicate_register_and_bad_login() {
        let store = MemoryUserStore::new();
        let config = Arc::new(IdentityConfig::development());

        let first = app(&store, &config)
            .oneshot(json_request(
                "POST",
                "/auth/register",
                register_body("heidi", "heidi@example.com"),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let (status, body) = read(
            app(&store, &config)
                .oneshot(json_request(
                    "POST",
                    "/auth/register",
                    register_body("HEIDI", "heidi2@example.com"),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (status, _) = read(
            app(&store, &config)
                .oneshot(json_request(
                    "POST",
                    "/auth/login",
                    json!({ "email": "heidi@example.com", "password": "wrong-password" }),
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_expires_cookie() {
        let store = MemoryUserStore::new();
        let config = Arc::new(IdentityConfig::development());

        let request = Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .body(Body::empty())
            .unwrap();
        let response = app(&store, &config).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("crowd_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
