#![allow(dead_code)]

use std::sync::Arc;

use annotations::{
    annotations::store::{AnnotationStore, MemoryAnnotationStore},
    app::build_app,
    auth::JwtKeys,
    config::{AppConfig, JwtConfig},
    state::AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-iss".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        },
        host: "127.0.0.1".into(),
        port: 0,
    }
}

pub struct TestApp {
    pub router: Router,
    keys: JwtKeys,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryAnnotationStore::new()))
    }

    pub fn with_store(store: Arc<dyn AnnotationStore>) -> Self {
        let config = test_config();
        let keys = JwtKeys::from(&config.jwt);
        let state = AppState::from_parts(Arc::new(config), store);
        Self {
            router: build_app(state),
            keys,
        }
    }

    pub fn token(&self, user_id: Uuid) -> String {
        self.keys.sign(user_id).expect("sign token")
    }

    /// Sends a request as `user` and returns the status plus the JSON body
    /// (`Null` when the body is empty or not JSON).
    pub async fn send(
        &self,
        user: Option<Uuid>,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("authorization", format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        read_json(response).await
    }

    pub async fn create(&self, user: Uuid, body: serde_json::Value) -> serde_json::Value {
        let (status, json) = self.send(Some(user), "POST", "/api/annotations", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json["annotation"].clone()
    }
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
