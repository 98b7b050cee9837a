//! HTTP surface over [`ParametrizationService`].

pub mod error;
mod handlers;

use axum::{
    Router,
    routing::{delete, get, patch},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::{ParamError, ParametrizationService, Result};

pub fn build_router(service: ParametrizationService) -> Router {
    Router::new()
        .route("/api/parametrizations", get(handlers::list_all).post(handlers::create))
        .route("/api/parametrizations/{id}", get(handlers::get_by_id).put(handlers::update).delete(handlers::delete))
        .route("/api/parametrizations/key/{key}", get(handlers::get_by_key))
        .route("/api/parametrizations/{id}/enable", patch(handlers::set_enabled))
        .route("/api/parametrizations/{id}/nocache", delete(handlers::delete_no_cache))
        .with_state(service)
}

/// Serves the API on `listen` until ctrl-c.
pub async fn serve(
    service: ParametrizationService,
    listen: &str,
) -> Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!("listening on {}", listen);

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|e| ParamError::Server(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        cache::{Cache, CacheBackend, MemCache, Namespace},
        seed,
        store::MemStore,
    };

    fn app() -> Router {
        let store = Arc::new(MemStore::new());
        seed::load_defaults(store.as_ref()).unwrap();
        build_router(ParametrizationService::new(store, Cache::new(Arc::new(MemCache::new(64)))))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_list_and_lookups() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/api/parametrizations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (status, body) = send(&app, Method::GET, "/api/parametrizations/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["key"], "BETA_FEATURES");
        assert!(body["createdAt"].is_string());

        let (status, body) = send(&app, Method::GET, "/api/parametrizations/key/DARK_MODE", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 4);
    }

    #[tokio::test]
    async fn test_missing_record_is_404() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/api/parametrizations/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");

        let (status, _) = send(&app, Method::GET, "/api/parametrizations/key/NOPE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_and_conflict() {
        let app = app();
        let draft = json!({"key": "CHECKOUT_V2", "description": "Enable Checkout V2", "enabled": true});

        let (status, body) = send(&app, Method::POST, "/api/parametrizations", Some(draft.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 5);
        assert_eq!(body["enabled"], true);

        let (status, body) = send(&app, Method::POST, "/api/parametrizations", Some(draft)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let app = app();
        let draft = json!({"key": "BETA_FEATURES", "description": "Beta for everyone", "enabled": true});

        let (status, _) = send(&app, Method::PUT, "/api/parametrizations/999", Some(draft.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, before) = send(&app, Method::GET, "/api/parametrizations/2", None).await;
        let (status, body) = send(&app, Method::PUT, "/api/parametrizations/2", Some(draft)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 2);
        assert_eq!(body["description"], "Beta for everyone");
        assert_eq!(body["createdAt"], before["createdAt"]);
    }

    #[tokio::test]
    async fn test_enable_evicts_cached_record() {
        let app = app();
        let (_, before) = send(&app, Method::GET, "/api/parametrizations/2", None).await;
        assert_eq!(before["enabled"], false);

        let (status, _) = send(&app, Method::PATCH, "/api/parametrizations/2/enable?enable=true", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, after) = send(&app, Method::GET, "/api/parametrizations/2", None).await;
        assert_eq!(after["enabled"], true);
    }

    #[tokio::test]
    async fn test_enable_missing_id_is_no_content() {
        let app = app();
        let (status, _) = send(&app, Method::PATCH, "/api/parametrizations/9999/enable?enable=true", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, Method::GET, "/api/parametrizations", None).await;
        assert_eq!(body.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_delete_paths_diverge() {
        let app = app();
        send(&app, Method::GET, "/api/parametrizations/3", None).await;

        let (status, _) = send(&app, Method::DELETE, "/api/parametrizations/3", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, "/api/parametrizations/3", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // the delete above evicted every cached record, so cache id 4 again
        send(&app, Method::GET, "/api/parametrizations/4", None).await;
        let (status, _) = send(&app, Method::DELETE, "/api/parametrizations/4/nocache", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::GET, "/api/parametrizations/4", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["key"], "DARK_MODE");
    }

    struct GarbledBackend;

    impl CacheBackend for GarbledBackend {
        fn get_or_insert_with(
            &self,
            _namespace: Namespace,
            _key: &str,
            _init: &mut dyn FnMut() -> Result<String>,
        ) -> Result<String> {
            Ok("{not json".to_string())
        }

        fn evict(
            &self,
            _namespace: Namespace,
            _key: &str,
        ) -> Result<()> {
            Ok(())
        }

        fn evict_all(
            &self,
            _namespace: Namespace,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_is_server_error() {
        let app = build_router(ParametrizationService::new(Arc::new(MemStore::new()), Cache::new(Arc::new(GarbledBackend))));

        let (status, body) = send(&app, Method::GET, "/api/parametrizations/1", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal_error");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_rejected() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/parametrizations/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
