use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    pub release_date: String,
    pub total_tracks: u32,
    pub images: Vec<Image>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl Album {
    /// A single is an album release holding exactly one track.
    pub fn is_single(&self) -> bool {
        self.total_tracks == 1
    }
}

/// A fully detailed track. Popularity is provider-assigned (0-100) and may
/// lag behind for fresh releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub popularity: u8,
    pub duration_ms: u64,
    pub preview_url: Option<String>,
    pub explicit: bool,
    pub album: Option<Album>,
}

impl Track {
    pub fn primary_artist(&self) -> Option<&ArtistRef> {
        self.artists.first()
    }

    pub fn is_by_primary_artist(&self, artist_id: &str) -> bool {
        self.primary_artist().is_some_and(|a| a.id == artist_id)
    }
}

/// Entry of a paginated album listing. The listing omits popularity, so a
/// stub has to be enriched through a track-detail call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStub {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub followers: Followers,
    pub images: Vec<Image>,
}

impl Artist {
    pub fn to_ref(&self) -> ArtistRef {
        ArtistRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// One page of a paginated provider listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u32,
    pub limit: u32,
    pub total: u32,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
            limit: 0,
            total: 0,
            has_next: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Track,
    Album,
    Artist,
}

impl SearchKind {
    pub const ALL: [SearchKind; 3] = [SearchKind::Track, SearchKind::Artist, SearchKind::Album];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Album => "album",
            SearchKind::Artist => "artist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "track" => Some(SearchKind::Track),
            "album" => Some(SearchKind::Album),
            "artist" => Some(SearchKind::Artist),
            _ => None,
        }
    }
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub kinds: Vec<SearchKind>,
    pub limit: u32,
    pub offset: u32,
}

impl SearchRequest {
    pub fn tracks(query: impl Into<String>, limit: u32, offset: u32) -> Self {
        Self {
            query: query.into(),
            kinds: vec![SearchKind::Track],
            limit,
            offset,
        }
    }
}

/// Search result pages, one per requested kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Page<Track>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artists: Option<Page<Artist>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub albums: Option<Page<Album>>,
}

#[cfg(test)]
impl Track {
    pub fn mock(id: &str, artist_id: &str, popularity: u8) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Track {}", id),
            artists: vec![ArtistRef {
                id: artist_id.to_string(),
                name: format!("Artist {}", artist_id),
            }],
            popularity,
            duration_ms: 180000,
            preview_url: None,
            explicit: false,
            album: None,
        }
    }
}

#[cfg(test)]
impl Album {
    pub fn mock(id: &str, total_tracks: u32) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Album {}", id),
            release_date: "2024-01-01".to_string(),
            total_tracks,
            images: vec![Image {
                url: format!("https://i.scdn.co/image/{}", id),
                height: Some(640),
                width: Some(640),
            }],
            artists: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Artist {
    pub fn mock(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            genres: vec!["indie".to_string()],
            followers: Followers { total: 1000 },
            images: Vec::new(),
        }
    }
}
