use std::time::Duration;

use futures::future::try_join_all;
use reqwest::StatusCode;
use rspotify::http::HttpError;
use rspotify::model::{
    AlbumId, ApiError, ArtistId, FullAlbum, FullArtist, FullTrack, SearchResult, SearchType,
    SimplifiedAlbum, SimplifiedArtist, TrackId,
};
use rspotify::prelude::*;
use rspotify::{ClientCredsSpotify, ClientError, ClientResult};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::spotify::auth::TokenProvider;
use crate::spotify::gateway::CatalogGateway;
use crate::spotify::models::{
    Album, Artist, ArtistRef, Followers, Image, Page, SearchKind, SearchRequest, SearchResults,
    Track, TrackStub,
};

impl From<rspotify::model::Image> for Image {
    fn from(image: rspotify::model::Image) -> Self {
        Image {
            url: image.url,
            height: image.height,
            width: image.width,
        }
    }
}

impl From<SimplifiedArtist> for ArtistRef {
    fn from(artist: SimplifiedArtist) -> Self {
        ArtistRef {
            id: artist.id.map(|id| id.id().to_string()).unwrap_or_default(),
            name: artist.name,
        }
    }
}

impl From<FullAlbum> for Album {
    fn from(album: FullAlbum) -> Self {
        Album {
            id: album.id.id().to_string(),
            name: album.name,
            release_date: album.release_date,
            total_tracks: album.tracks.total,
            images: album.images.into_iter().map(Image::from).collect(),
            artists: album.artists.into_iter().map(ArtistRef::from).collect(),
        }
    }
}

impl From<FullArtist> for Artist {
    fn from(artist: FullArtist) -> Self {
        Artist {
            id: artist.id.id().to_string(),
            name: artist.name,
            genres: artist.genres,
            followers: Followers {
                total: u64::from(artist.followers.total),
            },
            images: artist.images.into_iter().map(Image::from).collect(),
        }
    }
}

/// Simplified albums carry no track count, so `total_tracks` stays 0.
fn simplified_album(album: SimplifiedAlbum) -> Option<Album> {
    Some(Album {
        id: album.id?.id().to_string(),
        name: album.name,
        release_date: album.release_date.unwrap_or_default(),
        total_tracks: 0,
        images: album.images.into_iter().map(Image::from).collect(),
        artists: album.artists.into_iter().map(ArtistRef::from).collect(),
    })
}

/// Local files carry no id and cannot be ranked.
fn full_track(track: FullTrack) -> Option<Track> {
    Some(Track {
        id: track.id?.id().to_string(),
        name: track.name,
        artists: track.artists.into_iter().map(ArtistRef::from).collect(),
        popularity: track.popularity.min(100) as u8,
        duration_ms: track.duration.num_milliseconds().max(0) as u64,
        preview_url: track.preview_url,
        explicit: track.explicit,
        album: simplified_album(track.album),
    })
}

fn into_page<T, U>(page: rspotify::model::Page<T>, convert: impl Fn(T) -> Option<U>) -> Page<U> {
    Page {
        items: page.items.into_iter().filter_map(convert).collect(),
        offset: page.offset,
        limit: page.limit,
        total: page.total,
        has_next: page.next.is_some(),
    }
}

fn search_type(kind: SearchKind) -> SearchType {
    match kind {
        SearchKind::Track => SearchType::Track,
        SearchKind::Album => SearchType::Album,
        SearchKind::Artist => SearchType::Artist,
    }
}

fn invalid_id(kind: &str, id: &str) -> AppError {
    AppError::Validation(format!("invalid {} id: '{}'", kind, id))
}

/// Catalog client over rspotify's client-credentials flow.
pub struct SpotifyClient {
    tokens: TokenProvider,
    request_timeout: Duration,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            tokens: TokenProvider::new(config)?,
            request_timeout: config.request_timeout,
        })
    }

    fn spotify(&self) -> &ClientCredsSpotify {
        self.tokens.spotify()
    }

    /// Runs one catalog request with a fresh token and the configured
    /// deadline, translating rspotify failures into `AppError`.
    async fn call<T>(
        &self,
        endpoint: &str,
        request: impl Future<Output = ClientResult<T>>,
    ) -> Result<T> {
        self.tokens.access_token().await?;
        debug!("GET {}", endpoint);

        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(self.upstream_error(endpoint, err).await),
            Err(_) => {
                warn!(
                    "Spotify request {} timed out after {:?}",
                    endpoint, self.request_timeout
                );
                Err(AppError::Upstream {
                    status: StatusCode::GATEWAY_TIMEOUT.as_u16(),
                    message: format!("{} timed out", endpoint),
                })
            }
        }
    }

    async fn upstream_error(&self, endpoint: &str, err: ClientError) -> AppError {
        let response = match err {
            ClientError::Http(http) => match *http {
                HttpError::StatusCode(response) => response,
                HttpError::Client(e) => return AppError::Http(e),
            },
            ClientError::ParseJson(e) => return AppError::Json(e),
            ClientError::InvalidToken => {
                return AppError::Auth {
                    status: None,
                    message: "no access token available".into(),
                };
            }
            other => {
                return AppError::Upstream {
                    status: StatusCode::BAD_GATEWAY.as_u16(),
                    message: other.to_string(),
                };
            }
        };

        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        let message = api_error_message(status, &error_text);
        warn!("Spotify request {} failed ({}): {}", endpoint, status, message);

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
            return AppError::Auth {
                status: Some(status.as_u16()),
                message,
            };
        }

        AppError::Upstream {
            status: status.as_u16(),
            message,
        }
    }

    async fn search_kind(&self, request: &SearchRequest, kind: SearchKind) -> Result<SearchResult> {
        self.call(
            "search",
            self.spotify().search(
                &request.query,
                search_type(kind),
                None,
                None,
                Some(request.limit),
                Some(request.offset),
            ),
        )
        .await
    }
}

impl CatalogGateway for SpotifyClient {
    async fn track(&self, id: &str) -> Result<Track> {
        let track_id = TrackId::from_id(id).map_err(|_| invalid_id("track", id))?;
        let track = self
            .call("tracks", self.spotify().track(track_id, None))
            .await?;
        full_track(track).ok_or_else(|| AppError::NotFound(format!("track {}", id)))
    }

    async fn album(&self, id: &str) -> Result<Album> {
        let album_id = AlbumId::from_id(id).map_err(|_| invalid_id("album", id))?;
        let album = self
            .call("albums", self.spotify().album(album_id, None))
            .await?;
        Ok(album.into())
    }

    async fn artist(&self, id: &str) -> Result<Artist> {
        let artist_id = ArtistId::from_id(id).map_err(|_| invalid_id("artist", id))?;
        let artist = self
            .call("artists", self.spotify().artist(artist_id))
            .await?;
        Ok(artist.into())
    }

    async fn album_tracks(&self, album_id: &str, offset: u32, limit: u32) -> Result<Page<TrackStub>> {
        let id = AlbumId::from_id(album_id).map_err(|_| invalid_id("album", album_id))?;
        let page = self
            .call(
                "album tracks",
                self.spotify()
                    .album_track_manual(id, None, Some(limit), Some(offset)),
            )
            .await?;

        Ok(into_page(page, |stub| {
            Some(TrackStub {
                id: stub.id?.id().to_string(),
                name: stub.name,
            })
        }))
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let pages = try_join_all(
            request
                .kinds
                .iter()
                .map(|kind| self.search_kind(request, *kind)),
        )
        .await?;

        let mut results = SearchResults::default();
        for page in pages {
            match page {
                SearchResult::Tracks(page) => results.tracks = Some(into_page(page, full_track)),
                SearchResult::Artists(page) => {
                    results.artists = Some(into_page(page, |a| Some(Artist::from(a))))
                }
                SearchResult::Albums(page) => {
                    results.albums = Some(into_page(page, simplified_album))
                }
                _ => {}
            }
        }
        Ok(results)
    }
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError::Regular { message, .. }) | Ok(ApiError::Player { message, .. }) => message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::State;
    use axum::response::Json;
    use axum::routing::{get, post};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;

    const ALBUM_ID: &str = "4aawyAB9vmqN3uQ7FjRGTy";
    const TRACK_ID: &str = "3n3Ppam7vgaVa1iaRUc9Lp";

    async fn issue_token(State(exchanges): State<Arc<AtomicUsize>>) -> Json<Value> {
        let n = exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({
            "access_token": format!("token-{}", n),
            "token_type": "Bearer",
            "expires_in": 3600
        }))
    }

    /// Local stand-in for the accounts service and the catalog API.
    async fn start_stub() -> (String, Arc<AtomicUsize>) {
        let exchanges = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/api/token", post(issue_token))
            .route(
                "/v1/albums/{id}",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": {"status": 404, "message": "Resource not found"}})),
                    )
                }),
            )
            .route(
                "/v1/tracks/{id}",
                get(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"error": {"status": 401, "message": "The access token expired"}})),
                    )
                }),
            )
            .with_state(exchanges.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), exchanges)
    }

    fn client_for(base: &str) -> SpotifyClient {
        let config = Config {
            api_base: format!("{}/v1/", base),
            auth_base: format!("{}/", base),
            ..Config::new("id", "secret")
        };
        SpotifyClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_provider_status_and_message_are_surfaced() {
        let (base, exchanges) = start_stub().await;
        let client = client_for(&base);

        let err = client.album(ALBUM_ID).await.unwrap_err();
        match &err {
            AppError::Upstream { status, message } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "Resource not found");
            }
            other => panic!("expected an upstream error, got {:?}", other),
        }
        assert_eq!(err.status_code(), 404);
        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_invalidates_cached_token() {
        let (base, exchanges) = start_stub().await;
        let client = client_for(&base);

        let err = client.track(TRACK_ID).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Auth {
                status: Some(401),
                ..
            }
        ));
        assert_eq!(err.status_code(), 401);
        assert_eq!(exchanges.load(Ordering::SeqCst), 1);

        // the rejected token is gone, so the next call exchanges again
        let _ = client.album(ALBUM_ID).await;
        assert_eq!(exchanges.load(Ordering::SeqCst), 2);
        let _ = client.album(ALBUM_ID).await;
        assert_eq!(exchanges.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected_before_any_request() {
        let (base, exchanges) = start_stub().await;
        let client = client_for(&base);

        let err = client.artist("not an id").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(exchanges.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_api_error_message_extracts_provider_message() {
        let body = r#"{"error":{"status":404,"message":"Resource not found"}}"#;
        assert_eq!(
            api_error_message(StatusCode::NOT_FOUND, body),
            "Resource not found"
        );
        assert_eq!(
            api_error_message(StatusCode::BAD_GATEWAY, ""),
            "Bad Gateway"
        );
        assert_eq!(
            api_error_message(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            "oops"
        );
    }

    #[test]
    fn test_track_payload_normalizes() {
        let payload = json!({
            "album": {
                "album_type": "album",
                "artists": [],
                "external_urls": {},
                "href": null,
                "id": "4OHNH3sDzIxnmUADXzv2kT",
                "images": [{"url": "https://i.scdn.co/image/abc", "height": 640, "width": 640}],
                "name": "Hot Fuss",
                "release_date": "2004-06-07"
            },
            "artists": [{
                "external_urls": {},
                "href": null,
                "id": "0C0XlULifJtAgn6ZNCW2eu",
                "name": "The Killers"
            }],
            "disc_number": 1,
            "duration_ms": 222075,
            "explicit": false,
            "external_ids": {},
            "external_urls": {},
            "href": null,
            "id": "3n3Ppam7vgaVa1iaRUc9Lp",
            "is_local": false,
            "name": "Mr. Brightside",
            "popularity": 87,
            "preview_url": null,
            "track_number": 2
        });

        let track = full_track(serde_json::from_value::<FullTrack>(payload).unwrap()).unwrap();

        assert_eq!(track.popularity, 87);
        assert_eq!(track.duration_ms, 222075);
        assert_eq!(track.primary_artist().unwrap().name, "The Killers");
        let album = track.album.unwrap();
        assert_eq!(album.id, "4OHNH3sDzIxnmUADXzv2kT");
        assert_eq!(album.total_tracks, 0);
        assert_eq!(album.images[0].height, Some(640));
    }
}
