//! Route table and middleware stack

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::handlers::{
    artworks, exhibitions, health, loans, museums, public, reports, restorations, restorers,
    taxonomy,
};
use crate::middleware::{rate_limit::rate_limit_middleware, request_metrics::track_requests};
use crate::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        // Visitor endpoints
        .route("/public/home", get(public::home))
        .route("/public/artworks", get(public::gallery))
        .route("/public/artworks/{id}", get(public::artwork))
        // Lookup tables
        .route(
            "/taxonomy/{kind}",
            get(taxonomy::list_entries).post(taxonomy::create_entry),
        )
        .route(
            "/taxonomy/{kind}/{id}",
            put(taxonomy::rename_entry).delete(taxonomy::delete_entry),
        )
        // Artworks
        .route(
            "/artworks",
            get(artworks::list_artworks).post(artworks::create_artwork),
        )
        .route(
            "/artworks/{id}",
            get(artworks::get_artwork)
                .put(artworks::update_artwork)
                .delete(artworks::delete_artwork),
        )
        // Restorers
        .route(
            "/restorers",
            get(restorers::list_restorers).post(restorers::create_restorer),
        )
        .route(
            "/restorers/{id}",
            get(restorers::get_restorer)
                .put(restorers::update_restorer)
                .delete(restorers::delete_restorer),
        )
        // Restorations
        .route(
            "/restorations",
            get(restorations::list_restorations).post(restorations::begin_restoration),
        )
        .route("/restorations/{id}", get(restorations::get_restoration))
        .route(
            "/restorations/{id}/complete",
            post(restorations::complete_restoration),
        )
        .route(
            "/restorations/{id}/team",
            put(restorations::change_team).delete(restorations::clear_team),
        )
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/{id}", get(loans::get_loan))
        .route("/loans/{id}/return", post(loans::return_loan))
        // Exhibitions
        .route(
            "/exhibitions",
            get(exhibitions::list_exhibitions).post(exhibitions::create_exhibition),
        )
        .route("/exhibitions/current", get(exhibitions::current_exhibitions))
        .route(
            "/exhibitions/{id}",
            get(exhibitions::get_exhibition)
                .put(exhibitions::update_exhibition)
                .delete(exhibitions::delete_exhibition),
        )
        // Partner museums and their requests
        .route(
            "/museums",
            get(museums::list_museums).post(museums::create_museum),
        )
        .route(
            "/museums/{id}",
            get(museums::get_museum)
                .put(museums::update_museum)
                .delete(museums::delete_museum),
        )
        .route(
            "/loan-requests",
            get(museums::list_requests).post(museums::create_request),
        )
        .route(
            "/loan-requests/{id}/decision",
            post(museums::decide_request),
        )
        // Reports
        .route("/reports/maintenance", get(reports::maintenance))
        .route("/reports/valuation", get(reports::valuation))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(from_fn(track_requests));

    // Compose the app
    Router::new()
        .nest("/api/v1", api_routes)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use museo_common::{
        auth::Role,
        config::AppConfig,
        db::MemoryStore,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("test-secret".to_string());
        config.rate_limit.enabled = false;
        AppState::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    fn token(state: &AppState, role: Role) -> String {
        state.jwt.generate_token("tester@museo.org", role).unwrap()
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn entry(app: &Router, bearer: &str, kind: &str, name: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            &format!("/api/v1/taxonomy/{}", kind),
            Some(bearer),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn painting(app: &Router, bearer: &str, title: &str) -> String {
        let room = entry(app, bearer, "room", &format!("Sala {}", title)).await;
        let period = entry(app, bearer, "period", &format!("Periodo {}", title)).await;
        let style = entry(app, bearer, "style", &format!("Estilo {}", title)).await;
        let oil = entry(app, bearer, "technique", &format!("Óleo {}", title)).await;

        let (status, body) = call(
            app,
            Method::POST,
            "/api/v1/artworks",
            Some(bearer),
            Some(json!({
                "title": title,
                "author": "Vincent van Gogh",
                "valuation": "1000000.00",
                "creation_date": "1889",
                "museum_entry_date": "1941-06-01",
                "kind": "painting",
                "technique_ids": [oil],
                "period_id": period,
                "room_id": room,
                "style_ids": [style],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state());
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = call(&app, Method::GET, "/api/v1/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["storage"]["backend"], "memory");
    }

    #[tokio::test]
    async fn test_mutations_need_a_staff_token() {
        let state = test_state();
        let app = create_router(state.clone());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/taxonomy/room",
            None,
            Some(json!({ "name": "Sala 1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let restorer = token(&state, Role::ChiefRestorer);
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/taxonomy/room",
            Some(&restorer),
            Some(json!({ "name": "Sala 1" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, Method::GET, "/api/v1/artworks", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valuation_follows_role() {
        let state = test_state();
        let app = create_router(state.clone());
        let manager = token(&state, Role::CatalogManager);
        let restorer = token(&state, Role::ChiefRestorer);
        let id = painting(&app, &manager, "La noche estrellada").await;

        let uri = format!("/api/v1/artworks/{}", id);
        let (_, body) = call(&app, Method::GET, &uri, Some(&manager), None).await;
        assert_eq!(body["valuation"], "1000000.00");
        assert_eq!(body["state"], "in_storage");

        let (status, body) = call(&app, Method::GET, &uri, Some(&restorer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("valuation").is_none());

        let (status, _) = call(&app, Method::GET, "/api/v1/reports/valuation", Some(&restorer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rejections_list_every_violation() {
        let state = test_state();
        let app = create_router(state.clone());
        let director = token(&state, Role::Director);
        painting(&app, &director, "Los girasoles").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/artworks",
            Some(&director),
            Some(json!({
                "title": "los girasoles",
                "author": "",
                "valuation": "10",
                "creation_date": "1888",
                "museum_entry_date": "1950-01-01",
                "kind": "painting",
                "period_id": uuid::Uuid::new_v4(),
                "room_id": uuid::Uuid::new_v4(),
                "style_ids": [],
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        let details = body["error"]["details"].as_array().unwrap();
        assert!(details.len() >= 5, "{}", body);
        assert!(details.iter().any(|v| v["kind"] == "conflict" && v["field"] == "title"));
    }

    #[tokio::test]
    async fn test_public_gallery_shows_only_displayed_works() {
        let state = test_state();
        let app = create_router(state.clone());
        let director = token(&state, Role::Director);
        let id = painting(&app, &director, "Autorretrato").await;

        let (status, body) = call(&app, Method::GET, "/api/v1/public/artworks", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);

        let (status, _) = call(
            &app,
            Method::GET,
            &format!("/api/v1/public/artworks/{}", id),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::GET, "/api/v1/public/home", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recent_artworks"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_taxonomy_kind_is_bad_request() {
        let app = create_router(test_state());
        let (status, body) = call(&app, Method::GET, "/api/v1/taxonomy/colour", None, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_FORMAT");
    }
}
