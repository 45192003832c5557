// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{admin, fallback::fallback_handler, health::health_handler, login::login_handler};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub fn build_router(state: Arc<AppState>) -> Router {
    let login_route = state.config.auth.login_route.clone();
    let cors = create_cors_layer(&state.config.server.cors_origins);
    let assets = static_fallback(&state.config.server.static_dirs);

    Router::new()
        // Public endpoints
        .route(&login_route, post(login_handler))
        .route("/health", get(health_handler))

        // Admin endpoints (require API key)
        .route("/user/add", post(admin::user_add_handler))
        .route("/user/update", post(admin::user_update_handler))
        .route("/user/remove", post(admin::user_remove_handler))
        .route("/user/allow", post(admin::user_allow_handler))
        .route("/user/disallow", post(admin::user_disallow_handler))
        .route("/user/info", get(admin::user_info_handler))
        .route("/user/list", get(admin::user_list_handler))
        .route("/user/compare", get(admin::user_compare_handler))

        // Static directories, then the JSON 404
        .fallback_service(assets)
        .layer(cors)
        .with_state(state)
}

/// Chain the static directories so each one falls through to the next.
fn static_fallback(dirs: &[PathBuf]) -> Router {
    dirs.iter().rev().fold(
        Router::new().fallback(fallback_handler),
        |next, dir| {
            Router::new().fallback_service(
                ServeDir::new(dir)
                    .call_fallback_on_method_not_allowed(true)
                    .fallback(next),
            )
        },
    )
}

/// Any origin when the list is empty, otherwise only the listed ones
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed.is_empty() {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::models::permission::PermLevel;
    use crate::stores::memory_store::MemoryUserStore;
    use crate::users::hasher::{HashAlgorithm, PasswordHasher};
    use crate::users::manager::UserManager;
    use crate::utils::time::SystemClock;
    use axum::{
        body::Body,
        extract::connect_info::MockConnectInfo,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use tower::ServiceExt;

    const ADMIN_KEY: &str = "secret";

    fn test_config(extra_server: &str, extra_auth: &str) -> Config {
        Config::parse(&format!(
            "[server]\nport = 8080\n{}\n[database]\nurl = \"memory:\"\n[auth]\nadmin_api_key = \"{}\"\n{}\n",
            extra_server, ADMIN_KEY, extra_auth
        ))
        .unwrap()
    }

    fn test_state(config: Config) -> Arc<AppState> {
        let manager = UserManager::new(
            Arc::new(MemoryUserStore::new()),
            PasswordHasher::new(HashAlgorithm::Sha512),
            Arc::new(SystemClock),
        );
        Arc::new(AppState::new(config, Arc::new(manager)))
    }

    fn app(state: Arc<AppState>) -> Router {
        build_router(state).layer(MockConnectInfo(SocketAddr::from(([1, 2, 3, 4], 4567))))
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_user_count() {
        let state = test_state(test_config("", ""));
        state.users.create_user("a", "p", PermLevel::Mod).await.unwrap();

        let response = app(state).oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["users"], 1);
    }

    #[tokio::test]
    async fn test_login_grants_client_ip() {
        let state = test_state(test_config("", ""));
        let user = state.users.create_user("a", "p", PermLevel::Root).await.unwrap().unwrap();

        let response = app(state.clone())
            .oneshot(json_post("/login", serde_json::json!({"login": "a", "password": "p"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["reason"], "logged");

        let stored = state.users.get_user(&user.id).unwrap();
        assert!(stored.is_allowed("1.2.3.4"));
    }

    #[tokio::test]
    async fn test_login_refusals() {
        let state = test_state(test_config("", ""));
        state.users.create_user("a", "p", PermLevel::Root).await.unwrap();

        let cases = [
            (serde_json::json!({"login": "a", "password": "wrong"}), StatusCode::UNAUTHORIZED, "invalid password"),
            (serde_json::json!({"login": "b", "password": "p"}), StatusCode::NOT_FOUND, "no user"),
            (serde_json::json!({"login": "a"}), StatusCode::BAD_REQUEST, "no parameters"),
        ];

        for (payload, status, reason) in cases {
            let response = app(state.clone()).oneshot(json_post("/login", payload)).await.unwrap();
            assert_eq!(response.status(), status);
            assert_eq!(body_json(response).await["reason"], reason);
        }
    }

    #[tokio::test]
    async fn test_login_custom_route_and_form_fields() {
        let config = test_config(
            "",
            "login_route = \"/auth\"\nlogin_field = \"user\"\npassword_field = \"pass\"",
        );
        let state = test_state(config);
        state.users.create_user("a", "p", PermLevel::Visitor).await.unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/auth")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("user=a&pass=p"))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_rate_limited() {
        let state = test_state(test_config("", "max_login_attempts_per_minute = 2"));

        for _ in 0..2 {
            let response = app(state.clone())
                .oneshot(json_post("/login", serde_json::json!({})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = app(state)
            .oneshot(json_post("/login", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_admin_add_requires_key() {
        let state = test_state(test_config("", ""));
        let payload = serde_json::json!({"api_key": "nope", "login": "a", "password": "p"});

        let response = app(state.clone()).oneshot(json_post("/user/add", payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.users.is_empty());
    }

    #[tokio::test]
    async fn test_admin_user_lifecycle() {
        let state = test_state(test_config("", ""));

        let payload = serde_json::json!({"api_key": ADMIN_KEY, "login": "a", "password": "p", "perm": "admin"});
        let response = app(state.clone()).oneshot(json_post("/user/add", payload.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["user"]["login"], "a");
        assert_eq!(body["user"]["perm"], "Admin");
        assert!(body["user"].get("password").is_none());
        let id = body["user"]["id"].as_str().unwrap().to_string();

        let response = app(state.clone()).oneshot(json_post("/user/add", payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let allow = serde_json::json!({"api_key": ADMIN_KEY, "id": id, "ip": "9.9.9.9"});
        let response = app(state.clone()).oneshot(json_post("/user/allow", allow)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.users.get_user(&id).unwrap().is_allowed("9.9.9.9"));

        let update = serde_json::json!({"api_key": ADMIN_KEY, "id": id, "perm": 2});
        let response = app(state.clone()).oneshot(json_post("/user/update", update)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.users.get_user(&id).unwrap().perm, PermLevel::Mod);

        let uri = format!("/user/info?api_key={}&login=a", ADMIN_KEY);
        let response = app(state.clone()).oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(body_json(response).await["user"]["id"], id.as_str());

        let remove = serde_json::json!({"api_key": ADMIN_KEY, "id": id});
        let response = app(state.clone()).oneshot(json_post("/user/remove", remove.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state.clone()).oneshot(json_post("/user/remove", remove)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(state.users.is_empty());
    }

    #[tokio::test]
    async fn test_admin_update_with_empty_patch() {
        let state = test_state(test_config("", ""));
        let user = state.users.create_user("a", "p", PermLevel::Root).await.unwrap().unwrap();

        let update = serde_json::json!({"api_key": ADMIN_KEY, "id": user.id});
        let response = app(state).oneshot(json_post("/user/update", update)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_update_with_blank_password() {
        let state = test_state(test_config("", ""));
        let user = state.users.create_user("a", "p", PermLevel::Root).await.unwrap().unwrap();

        let update = serde_json::json!({"api_key": ADMIN_KEY, "id": user.id, "password": ""});
        let response = app(state.clone()).oneshot(json_post("/user/update", update)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let update = serde_json::json!({"api_key": ADMIN_KEY, "id": user.id, "login": ""});
        let response = app(state.clone()).oneshot(json_post("/user/update", update)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.users.get_user(&user.id), Some(user));
    }

    #[tokio::test]
    async fn test_admin_list_and_compare() {
        let state = test_state(test_config("", ""));
        state.users.create_user("b", "p", PermLevel::Root).await.unwrap();
        state.users.create_user("a", "p", PermLevel::Root).await.unwrap();

        let uri = format!("/user/list?api_key={}", ADMIN_KEY);
        let body = body_json(app(state.clone()).oneshot(get_request(&uri)).await.unwrap()).await;
        let logins: Vec<&str> = body["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["login"].as_str().unwrap())
            .collect();
        assert_eq!(logins, vec!["a", "b"]);

        let uri = format!("/user/compare?api_key={}&candidate=admin&reference=mod", ADMIN_KEY);
        let body = body_json(app(state.clone()).oneshot(get_request(&uri)).await.unwrap()).await;
        assert_eq!(body["result"], true);

        let uri = format!("/user/compare?api_key={}&candidate=visitor&reference=root&mode=label", ADMIN_KEY);
        let body = body_json(app(state).oneshot(get_request(&uri)).await.unwrap()).await;
        assert_eq!(body["result"], "inferior");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let state = test_state(test_config("", ""));

        let response = app(state).oneshot(get_request("/nothing/here")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_static_dirs_are_tried_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("shared.txt"), "first").unwrap();
        std::fs::write(second.path().join("shared.txt"), "second").unwrap();
        std::fs::write(second.path().join("only.txt"), "only").unwrap();

        let server = format!(
            "static_dirs = [\"{}\", \"{}\"]",
            first.path().display(),
            second.path().display()
        );
        let state = test_state(test_config(&server, ""));

        let response = app(state.clone()).oneshot(get_request("/shared.txt")).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"first");

        let response = app(state.clone()).oneshot(get_request("/only.txt")).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"only");

        let response = app(state).oneshot(get_request("/missing.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_create_cors_layer() {
        let _any = create_cors_layer(&[]);
        let _listed = create_cors_layer(&["http://localhost:3000".to_string()]);
    }
}
