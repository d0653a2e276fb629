use serde::Serialize;

use crate::rank::RankedCollection;
use crate::spotify::{Album, Artist, SearchResults, Track};

/// Outcome of a catalog lookup. The variant follows from the kind of link
/// that was looked up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LookupResult {
    Track(TrackLookup),
    Album(AlbumLookup),
    Artist(ArtistLookup),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackLookup {
    pub track: Track,
    pub album_tracks: RankedCollection,
    pub track_rank: Option<usize>,
    pub total_tracks: usize,
    /// Only present when the track was released as a single.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_top_tracks: Option<RankedCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_track_rank: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumLookup {
    pub album: Album,
    pub album_tracks: RankedCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistLookup {
    pub artist: Artist,
    pub top_tracks: RankedCollection,
}

/// What free-form input turned into: a lookup for catalog links, search
/// results for anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolution", rename_all = "lowercase")]
pub enum Resolution {
    Lookup(LookupResult),
    Search(SearchResults),
}
