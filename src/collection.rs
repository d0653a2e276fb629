//! Builds the collections a focal track is ranked against.
//!
//! An album collection is the album's complete track list, enriched with
//! per-track detail because the album listing carries no popularity.
//!
//! An artist collection approximates the artist's top 100 tracks. The
//! provider's own top-tracks endpoint returns at most ten, so the collection
//! is assembled from a paginated track search on the artist's name, keeping
//! only tracks whose first listed artist is the target artist. The search is
//! not guaranteed to be complete and stops at a fixed offset ceiling, so a
//! prolific artist's catalog can be under-counted.

use std::collections::HashSet;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use crate::error::Result;
use crate::rank::RankedCollection;
use crate::spotify::{Album, ArtistRef, CatalogGateway, Page, SearchRequest, Track, TrackStub};

pub const ALBUM_PAGE_SIZE: u32 = 50;
pub const SEARCH_PAGE_SIZE: u32 = 50;
/// Search pages are never requested at or beyond this offset.
pub const SEARCH_OFFSET_CEILING: u32 = 200;
pub const TOP_TRACKS_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct AlbumCollection {
    pub album: Album,
    pub tracks: RankedCollection,
}

pub struct CollectionResolver<G> {
    gateway: G,
    max_concurrency: usize,
}

impl<G: CatalogGateway> CollectionResolver<G> {
    pub fn new(gateway: G, max_concurrency: usize) -> Self {
        Self {
            gateway,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolves every track of an album, ranked by popularity.
    ///
    /// The album detail is fetched first; if it fails no listing request is
    /// made. The result never holds more tracks than the album declares.
    pub async fn album_tracks(&self, album_id: &str) -> Result<AlbumCollection> {
        let album = self.gateway.album(album_id).await?;
        self.album_collection(album).await
    }

    /// Lists and enriches the tracks of an already fetched album.
    pub async fn album_collection(&self, album: Album) -> Result<AlbumCollection> {
        let stubs = self.album_track_stubs(&album).await?;

        debug!(
            "Enriching {} tracks of album '{}' (concurrency {})",
            stubs.len(),
            album.name,
            self.max_concurrency
        );
        let tracks = self.enrich(stubs, &album).await?;

        info!(
            "Resolved {} of {} tracks for album '{}'",
            tracks.len(),
            album.total_tracks,
            album.name
        );

        Ok(AlbumCollection {
            tracks: RankedCollection::new(tracks),
            album,
        })
    }

    async fn album_track_stubs(&self, album: &Album) -> Result<Vec<TrackStub>> {
        let declared = match album.total_tracks {
            0 => usize::MAX,
            n => n as usize,
        };

        let mut stubs = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .gateway
                .album_tracks(&album.id, offset, ALBUM_PAGE_SIZE)
                .await?;

            // entries without an id are dropped by the gateway but still
            // occupy their slot in the provider's window
            let step = page.limit;
            stubs.extend(page.items);

            if !page.has_next || step == 0 || stubs.len() >= declared {
                break;
            }
            offset += step;
        }

        stubs.truncate(declared);
        Ok(stubs)
    }

    /// Fetches full detail for each stub, at most `max_concurrency` at a
    /// time, preserving listing order. The first failure aborts the batch.
    async fn enrich(&self, stubs: Vec<TrackStub>, album: &Album) -> Result<Vec<Track>> {
        let lookups: Vec<_> = stubs
            .into_iter()
            .map(|stub| self.enriched_track(stub, album))
            .collect();

        stream::iter(lookups)
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    async fn enriched_track(&self, stub: TrackStub, album: &Album) -> Result<Track> {
        let mut track = self.gateway.track(&stub.id).await?;
        // the detail's nested album often lacks artwork
        track.album = Some(album.clone());
        Ok(track)
    }

    /// Approximates the artist's 100 most popular tracks.
    pub async fn artist_top_tracks(&self, artist: &ArtistRef) -> Result<RankedCollection> {
        let query = format!("artist:\"{}\"", artist.name);
        let mut seen = HashSet::new();
        let mut collected: Vec<Track> = Vec::new();
        let mut offset = 0;

        while collected.len() < TOP_TRACKS_LIMIT && offset < SEARCH_OFFSET_CEILING {
            let request = SearchRequest::tracks(&query, SEARCH_PAGE_SIZE, offset);
            let page = self
                .gateway
                .search(&request)
                .await?
                .tracks
                .unwrap_or_else(Page::empty);

            if page.items.is_empty() {
                break;
            }

            let has_next = page.has_next;
            let before = collected.len();
            collected.extend(
                page.items
                    .into_iter()
                    .filter(|t| t.is_by_primary_artist(&artist.id))
                    .filter(|t| seen.insert(t.id.clone())),
            );
            debug!(
                "Search offset {} for '{}' kept {} primary-artist tracks",
                offset,
                artist.name,
                collected.len() - before
            );

            if !has_next {
                break;
            }
            offset += SEARCH_PAGE_SIZE;
        }

        info!(
            "Collected {} candidate top tracks for artist '{}'",
            collected.len(),
            artist.name
        );

        Ok(RankedCollection::top(collected, TOP_TRACKS_LIMIT))
    }
}
