//! Geo lookup proxy: re-exposes the upstream country/state/city routes under
//! `/api`, keeping the API key server-side and answering repeats from memory.

mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    response::Response,
    routing::get,
};
use log::{error, info};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::geo::{CscClient, GeoUpstream};

pub use error::ApiError;

pub const CACHE_CONTROL: &str = "public, s-maxage=86400, stale-while-revalidate=3600";

#[derive(Clone)]
pub struct ProxyState {
    pub cache: Arc<TtlCache<Value>>,
    pub upstream: Arc<dyn GeoUpstream>,
}

impl ProxyState {
    pub fn new(upstream: Arc<dyn GeoUpstream>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: Arc::new(TtlCache::in_memory(clock)),
            upstream,
        }
    }
}

async fn cache_hint(mut response: Response) -> Response {
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    }
    response
}

pub fn router(state: ProxyState) -> Router {
    let geo = Router::new()
        .route("/countries", get(routes::countries))
        .route("/countries/{country_iso}/states", get(routes::states))
        .route(
            "/countries/{country_iso}/states/{state_iso}/cities",
            get(routes::cities),
        )
        .layer(middleware::map_response(cache_hint))
        .route("/health", get(routes::health));

    Router::new().nest("/api", geo).with_state(state)
}

/// Run the proxy until Ctrl+C.
pub async fn serve(config: &AppConfig, api_key: String, port: u16) -> Result<()> {
    let upstream = Arc::new(CscClient::new(&config.api.geo_base_url, api_key));
    let app = router(ProxyState::new(upstream, Arc::new(SystemClock)));

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Binding {}", addr))?;

    info!("Geo proxy running at http://localhost:{}/api", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Error listening for shutdown: {}", e);
            }
        })
        .await
        .context("Geo proxy server failed")?;

    info!("Geo proxy stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AdhkarError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, NaiveDate};
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeUpstream {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeUpstream {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GeoUpstream for FakeUpstream {
        async fn fetch(&self, path: &str) -> crate::error::Result<Value> {
            self.calls.lock().unwrap().push(path.to_string());
            if self.fail {
                return Err(AdhkarError::UpstreamStatus {
                    service: "geo API",
                    status: 503,
                });
            }
            Ok(json!([{ "name": "Egypt", "iso2": "EG", "path": path }]))
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        ))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, cache_control, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn repeated_lookup_hits_upstream_once() {
        let upstream = Arc::new(FakeUpstream::default());
        let app = router(ProxyState::new(upstream.clone(), clock()));

        let (status, cache_control, body) = get(&app, "/api/countries").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some(CACHE_CONTROL));
        assert_eq!(body[0]["iso2"], "EG");

        get(&app, "/api/countries").await;
        assert_eq!(upstream.calls(), vec!["/countries".to_string()]);
    }

    #[tokio::test]
    async fn lookup_is_refetched_after_a_day() {
        let upstream = Arc::new(FakeUpstream::default());
        let clock = clock();
        let app = router(ProxyState::new(upstream.clone(), clock.clone()));

        get(&app, "/api/countries/eg/states").await;
        clock.advance(Duration::hours(24));
        get(&app, "/api/countries/EG/states").await;

        assert_eq!(
            upstream.calls(),
            vec!["/countries/EG/states".to_string(); 2]
        );
    }

    #[tokio::test]
    async fn cities_route_forwards_both_codes() {
        let upstream = Arc::new(FakeUpstream::default());
        let app = router(ProxyState::new(upstream.clone(), clock()));

        let (status, _, body) = get(&app, "/api/countries/us/states/ca/cities").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["path"], "/countries/US/states/CA/cities");
    }

    #[tokio::test]
    async fn malformed_code_is_rejected_without_upstream_call() {
        let upstream = Arc::new(FakeUpstream::default());
        let app = router(ProxyState::new(upstream.clone(), clock()));

        let (status, cache_control, body) = get(&app, "/api/countries/EGYPT/states").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(cache_control.is_none());
        assert!(body["error"].as_str().unwrap().contains("EGYPT"));
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_a_bad_gateway_and_not_cached() {
        let upstream = Arc::new(FakeUpstream {
            fail: true,
            ..Default::default()
        });
        let app = router(ProxyState::new(upstream.clone(), clock()));

        let (status, cache_control, _) = get(&app, "/api/countries").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(cache_control.is_none());

        get(&app, "/api/countries").await;
        assert_eq!(upstream.calls().len(), 2);
    }

    #[tokio::test]
    async fn health_is_not_cache_hinted() {
        let app = router(ProxyState::new(Arc::new(FakeUpstream::default()), clock()));
        let (status, cache_control, body) = get(&app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(cache_control.is_none());
        assert_eq!(body["status"], "alive");
    }
}
