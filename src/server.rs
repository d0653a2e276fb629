use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::classifier::CatalogKind;
use crate::error::{AppError, Result};
use crate::lookup::orchestrator::DEFAULT_SEARCH_LIMIT;
use crate::lookup::{LookupResult, LookupService, Resolution};
use crate::spotify::{CatalogGateway, SearchKind, SearchResults};

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CatalogKind>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Comma-separated list of kinds, e.g. `track,artist`.
    #[serde(rename = "type")]
    pub kinds: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

pub fn router<G: CatalogGateway + 'static>(service: Arc<LookupService<G>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/lookup", get(lookup::<G>))
        .route("/api/resolve", get(resolve::<G>))
        .route("/api/search", get(search::<G>))
        .with_state(service)
}

pub async fn serve<G: CatalogGateway + 'static>(
    service: Arc<LookupService<G>>,
    addr: &str,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn lookup<G: CatalogGateway>(
    State(service): State<Arc<LookupService<G>>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResult>> {
    let result = match (params.url, params.kind, params.id) {
        (Some(url), _, _) => service.lookup(&url).await?,
        (None, Some(kind), Some(id)) => service.select(kind, &id).await?,
        _ => {
            return Err(AppError::Validation(
                "expected a 'url' parameter or both 'type' and 'id'".into(),
            ));
        }
    };
    Ok(Json(result))
}

async fn resolve<G: CatalogGateway>(
    State(service): State<Arc<LookupService<G>>>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<Resolution>> {
    let input = params.q.unwrap_or_default();
    Ok(Json(service.resolve(&input).await?))
}

async fn search<G: CatalogGateway>(
    State(service): State<Arc<LookupService<G>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>> {
    let kinds = parse_kinds(params.kinds.as_deref())?;
    let query = params.q.unwrap_or_default();
    let results = service
        .search(
            &query,
            &kinds,
            params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
            params.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(results))
}

fn parse_kinds(raw: Option<&str>) -> Result<Vec<SearchKind>> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(|kind| {
            SearchKind::parse(kind)
                .ok_or_else(|| AppError::Validation(format!("unknown search type '{}'", kind.trim())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::gateway::fake::FakeCatalog;
    use crate::spotify::{Album, Track};
    use pretty_assertions::assert_eq;

    async fn error_body(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_response_mirrors_status_in_body() {
        let (status, body) = error_body(AppError::Upstream {
            status: 404,
            message: "Resource not found".into(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"error": "Spotify API error (404): Resource not found", "status": 404})
        );

        let (status, body) = error_body(AppError::Validation("empty".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "Invalid input: empty");

        let (status, body) = error_body(AppError::Config("missing".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], 500);
        assert_eq!(body.as_object().map(|o| o.len()), Some(2));
    }

    #[tokio::test]
    async fn test_lookup_requires_url_or_type_and_id() {
        let service = Arc::new(LookupService::new(FakeCatalog::new(), 2));
        let params = LookupParams {
            url: None,
            kind: Some(CatalogKind::Track),
            id: None,
        };

        let err = lookup(State(service), Query(params)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_lookup_by_type_and_id() {
        let catalog = FakeCatalog::new()
            .with_album(Album::mock("abc", 2), vec![Track::mock("x", "a1", 5), Track::mock("y", "a1", 9)]);
        let service = Arc::new(LookupService::new(catalog, 2));
        let params = LookupParams {
            url: None,
            kind: Some(CatalogKind::Album),
            id: Some("abc".to_string()),
        };

        let Json(result) = lookup(State(service), Query(params)).await.unwrap();

        let LookupResult::Album(album) = result else {
            panic!("expected album branch");
        };
        assert_eq!(album.album_tracks.tracks()[0].id, "y");
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(parse_kinds(None).unwrap(), Vec::<SearchKind>::new());
        assert_eq!(parse_kinds(Some("  ")).unwrap(), Vec::<SearchKind>::new());
        assert_eq!(
            parse_kinds(Some("track, artist")).unwrap(),
            vec![SearchKind::Track, SearchKind::Artist]
        );
        assert!(matches!(
            parse_kinds(Some("track,podcast")),
            Err(AppError::Validation(_))
        ));
    }
}
