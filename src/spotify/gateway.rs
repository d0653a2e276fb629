use crate::error::Result;
use crate::spotify::models::{Album, Artist, Page, SearchRequest, SearchResults, Track, TrackStub};

/// The catalog calls the ranking core depends on.
///
/// `SpotifyClient` is the production implementation; tests substitute an
/// in-memory catalog.
pub trait CatalogGateway: Send + Sync {
    fn track(&self, id: &str) -> impl Future<Output = Result<Track>> + Send;

    fn album(&self, id: &str) -> impl Future<Output = Result<Album>> + Send;

    fn artist(&self, id: &str) -> impl Future<Output = Result<Artist>> + Send;

    fn album_tracks(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Page<TrackStub>>> + Send;

    fn search(&self, request: &SearchRequest) -> impl Future<Output = Result<SearchResults>> + Send;
}

#[cfg(test)]
pub mod fake {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::CatalogGateway;
    use crate::error::{AppError, Result};
    use crate::spotify::models::{
        Album, Artist, Page, SearchKind, SearchRequest, SearchResults, Track, TrackStub,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Track(String),
        Album(String),
        Artist(String),
        AlbumTracks { album_id: String, offset: u32 },
        Search { query: String, offset: u32 },
    }

    /// In-memory catalog that records every call it serves.
    #[derive(Default)]
    pub struct FakeCatalog {
        pub tracks: HashMap<String, Track>,
        pub albums: HashMap<String, Album>,
        pub album_listing: HashMap<String, Vec<TrackStub>>,
        pub artists: HashMap<String, Artist>,
        /// Track search hits served in order, sliced by offset/limit.
        pub search_hits: Vec<Track>,
        pub failures: HashMap<String, (u16, String)>,
        /// Album entries served without an id, as local files are.
        pub unlisted: HashSet<String>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_album(mut self, album: Album, tracks: Vec<Track>) -> Self {
            let stubs = tracks
                .iter()
                .map(|t| TrackStub {
                    id: t.id.clone(),
                    name: t.name.clone(),
                })
                .collect();
            self.album_listing.insert(album.id.clone(), stubs);
            for mut track in tracks {
                track.album = Some(Album {
                    images: Vec::new(),
                    ..album.clone()
                });
                self.tracks.insert(track.id.clone(), track);
            }
            self.albums.insert(album.id.clone(), album);
            self
        }

        pub fn with_artist(mut self, artist: Artist) -> Self {
            self.artists.insert(artist.id.clone(), artist);
            self
        }

        pub fn with_search_hits(mut self, hits: Vec<Track>) -> Self {
            self.search_hits = hits;
            self
        }

        pub fn without_listing_ids(mut self, ids: &[&str]) -> Self {
            self.unlisted.extend(ids.iter().map(|id| id.to_string()));
            self
        }

        /// Makes every call addressing `key` (an id, or a search query) fail
        /// with the given provider status.
        pub fn failing(mut self, key: &str, status: u16, message: &str) -> Self {
            self.failures
                .insert(key.to_string(), (status, message.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn search_offsets(&self) -> Vec<u32> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Search { offset, .. } => Some(offset),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn check(&self, key: &str) -> Result<()> {
            match self.failures.get(key) {
                Some((status, message)) => Err(AppError::Upstream {
                    status: *status,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }

        fn missing(what: &str) -> AppError {
            AppError::Upstream {
                status: 404,
                message: format!("{} not found", what),
            }
        }
    }

    impl CatalogGateway for FakeCatalog {
        async fn track(&self, id: &str) -> Result<Track> {
            self.record(Call::Track(id.to_string()));
            self.check(id)?;
            self.tracks
                .get(id)
                .cloned()
                .ok_or_else(|| Self::missing("track"))
        }

        async fn album(&self, id: &str) -> Result<Album> {
            self.record(Call::Album(id.to_string()));
            self.check(id)?;
            self.albums
                .get(id)
                .cloned()
                .ok_or_else(|| Self::missing("album"))
        }

        async fn artist(&self, id: &str) -> Result<Artist> {
            self.record(Call::Artist(id.to_string()));
            self.check(id)?;
            self.artists
                .get(id)
                .cloned()
                .ok_or_else(|| Self::missing("artist"))
        }

        async fn album_tracks(
            &self,
            album_id: &str,
            offset: u32,
            limit: u32,
        ) -> Result<Page<TrackStub>> {
            self.record(Call::AlbumTracks {
                album_id: album_id.to_string(),
                offset,
            });
            let listing = self
                .album_listing
                .get(album_id)
                .ok_or_else(|| Self::missing("album"))?;
            let mut page = slice_page(listing, offset, limit);
            page.items.retain(|stub| !self.unlisted.contains(&stub.id));
            Ok(page)
        }

        async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
            self.record(Call::Search {
                query: request.query.clone(),
                offset: request.offset,
            });
            self.check(&request.query)?;

            let mut results = SearchResults::default();
            for kind in &request.kinds {
                match kind {
                    SearchKind::Track => {
                        results.tracks =
                            Some(slice_page(&self.search_hits, request.offset, request.limit))
                    }
                    SearchKind::Artist => {
                        let artists: Vec<Artist> = self.artists.values().cloned().collect();
                        results.artists = Some(slice_page(&artists, request.offset, request.limit))
                    }
                    SearchKind::Album => {
                        let albums: Vec<Album> = self.albums.values().cloned().collect();
                        results.albums = Some(slice_page(&albums, request.offset, request.limit))
                    }
                }
            }
            Ok(results)
        }
    }

    fn slice_page<T: Clone>(all: &[T], offset: u32, limit: u32) -> Page<T> {
        let start = (offset as usize).min(all.len());
        let end = (start + limit as usize).min(all.len());
        Page {
            items: all[start..end].to_vec(),
            offset,
            limit,
            total: all.len() as u32,
            has_next: end < all.len(),
        }
    }
}
