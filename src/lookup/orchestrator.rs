use tracing::{debug, info};

use crate::classifier::{CatalogKind, CatalogRef, Classification, canonical_url, classify};
use crate::collection::{AlbumCollection, CollectionResolver};
use crate::error::{AppError, Result};
use crate::lookup::result::{AlbumLookup, ArtistLookup, LookupResult, Resolution, TrackLookup};
use crate::spotify::{CatalogGateway, SearchKind, SearchRequest, SearchResults};

pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// Entry point for lookups: classifies input, runs the matching branch and
/// shapes the response. Every branch either succeeds as a whole or returns
/// the first failure.
pub struct LookupService<G> {
    resolver: CollectionResolver<G>,
}

impl<G: CatalogGateway> LookupService<G> {
    pub fn new(gateway: G, max_concurrency: usize) -> Self {
        Self {
            resolver: CollectionResolver::new(gateway, max_concurrency),
        }
    }

    pub fn gateway(&self) -> &G {
        self.resolver.gateway()
    }

    /// Looks up a catalog link. Input that is not a track, album or artist
    /// link is rejected.
    pub async fn lookup(&self, input: &str) -> Result<LookupResult> {
        match classify(non_empty(input)?) {
            Classification::Catalog(catalog_ref) => self.lookup_ref(&catalog_ref).await,
            Classification::Query(_) => Err(AppError::Validation(
                "not a Spotify track, album or artist link".into(),
            )),
        }
    }

    /// Looks up an item picked from search results.
    pub async fn select(&self, kind: CatalogKind, id: &str) -> Result<LookupResult> {
        if !kind.is_valid_id(id) {
            return Err(AppError::Validation(format!("invalid {} id: '{}'", kind, id)));
        }
        self.lookup(&canonical_url(kind, id)).await
    }

    /// Looks up catalog links and searches for anything else.
    pub async fn resolve(&self, input: &str) -> Result<Resolution> {
        match classify(non_empty(input)?) {
            Classification::Catalog(catalog_ref) => {
                Ok(Resolution::Lookup(self.lookup_ref(&catalog_ref).await?))
            }
            Classification::Query(query) => {
                debug!("Treating '{}' as a search query", query);
                let results = self
                    .search(&query, &SearchKind::ALL, DEFAULT_SEARCH_LIMIT, 0)
                    .await?;
                Ok(Resolution::Search(results))
            }
        }
    }

    /// Free-text catalog search. An empty `kinds` slice searches every kind.
    pub async fn search(
        &self,
        query: &str,
        kinds: &[SearchKind],
        limit: u32,
        offset: u32,
    ) -> Result<SearchResults> {
        let query = non_empty(query)?;
        let kinds = if kinds.is_empty() {
            SearchKind::ALL.to_vec()
        } else {
            kinds.to_vec()
        };

        let request = SearchRequest {
            query: query.to_string(),
            kinds,
            limit: limit.clamp(1, MAX_SEARCH_LIMIT),
            offset,
        };
        self.gateway().search(&request).await
    }

    async fn lookup_ref(&self, catalog_ref: &CatalogRef) -> Result<LookupResult> {
        info!("Looking up {} {}", catalog_ref.kind, catalog_ref.id);

        match catalog_ref.kind {
            CatalogKind::Track => self.track_lookup(&catalog_ref.id).await.map(LookupResult::Track),
            CatalogKind::Album => self.album_lookup(&catalog_ref.id).await.map(LookupResult::Album),
            CatalogKind::Artist => {
                self.artist_lookup(&catalog_ref.id).await.map(LookupResult::Artist)
            }
        }
    }

    async fn artist_lookup(&self, artist_id: &str) -> Result<ArtistLookup> {
        // the top-tracks search is keyed on the artist's name
        let artist = self.gateway().artist(artist_id).await?;
        let top_tracks = self.resolver.artist_top_tracks(&artist.to_ref()).await?;

        Ok(ArtistLookup { artist, top_tracks })
    }

    async fn album_lookup(&self, album_id: &str) -> Result<AlbumLookup> {
        let AlbumCollection { album, tracks } = self.resolver.album_tracks(album_id).await?;

        Ok(AlbumLookup {
            album,
            album_tracks: tracks,
        })
    }

    async fn track_lookup(&self, track_id: &str) -> Result<TrackLookup> {
        let mut track = self.gateway().track(track_id).await?;

        let album_id = track
            .album
            .as_ref()
            .map(|a| a.id.clone())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::NotFound(format!("album of track {}", track_id)))?;

        // a track's album reference may omit the track total, so singles are
        // recognized from the album detail
        let album = self.gateway().album(&album_id).await?;
        let single_artist = if album.is_single() {
            let artist = track
                .primary_artist()
                .filter(|a| !a.id.is_empty())
                .ok_or_else(|| AppError::NotFound(format!("artist of track {}", track_id)))?;
            Some(artist.clone())
        } else {
            None
        };

        debug!(
            "Track '{}' is on album {} (single: {})",
            track.name,
            album.id,
            single_artist.is_some()
        );

        let top_tracks = async {
            match &single_artist {
                Some(artist) => self.resolver.artist_top_tracks(artist).await.map(Some),
                None => Ok(None),
            }
        };
        let (album_collection, artist_top_tracks) =
            tokio::try_join!(self.resolver.album_collection(album), top_tracks)?;

        let album_rank = album_collection.tracks.rank_of(&track.id);
        let artist_track_rank = artist_top_tracks
            .as_ref()
            .and_then(|top| top.rank_of(&track.id).position);

        info!(
            "Track '{}' ranks {:?} of {} on its album",
            track.name, album_rank.position, album_rank.total
        );

        track.album = Some(album_collection.album);
        Ok(TrackLookup {
            track,
            album_tracks: album_collection.tracks,
            track_rank: album_rank.position,
            total_tracks: album_rank.total,
            artist_top_tracks,
            artist_track_rank,
        })
    }
}

fn non_empty(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "enter a Spotify link or a search query".into(),
        ));
    }
    Ok(trimmed)
}
