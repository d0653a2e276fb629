//! Recognizes Spotify catalog links among free-form user input.
//!
//! Anything that is not a well-formed track, album or artist link is handed
//! back as a search query; classification itself never fails.

use rspotify::model::{AlbumId, ArtistId, TrackId};
use serde::{Deserialize, Serialize};
use url::Url;

const SPOTIFY_DOMAIN: &str = "spotify.com";
const CANONICAL_BASE: &str = "https://open.spotify.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Track,
    Album,
    Artist,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Track => "track",
            CatalogKind::Album => "album",
            CatalogKind::Artist => "artist",
        }
    }

    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "track" => Some(CatalogKind::Track),
            "album" => Some(CatalogKind::Album),
            "artist" => Some(CatalogKind::Artist),
            _ => None,
        }
    }

    /// Whether `id` is drawn from the provider's id alphabet for this kind.
    pub fn is_valid_id(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        match self {
            CatalogKind::Track => TrackId::from_id(id).is_ok(),
            CatalogKind::Album => AlbumId::from_id(id).is_ok(),
            CatalogKind::Artist => ArtistId::from_id(id).is_ok(),
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRef {
    pub kind: CatalogKind,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Catalog(CatalogRef),
    Query(String),
}

/// Classifies user input as a catalog link or a free-text query.
///
/// Supported forms:
/// - https://open.spotify.com/track/3n3Ppam7vgaVa1iaRUc9Lp?si=...
/// - https://open.spotify.com/intl-de/album/4aawyAB9vmqN3uQ7FjRGTy/
/// - open.spotify.com/artist/0C0XlULifJtAgn6ZNCW2eu
/// - spotify:track:3n3Ppam7vgaVa1iaRUc9Lp
pub fn classify(input: &str) -> Classification {
    let trimmed = input.trim();
    match parse_uri(trimmed).or_else(|| parse_url(trimmed)) {
        Some(catalog_ref) => Classification::Catalog(catalog_ref),
        None => Classification::Query(trimmed.to_string()),
    }
}

/// Link a search-result selection resolves to.
pub fn canonical_url(kind: CatalogKind, id: &str) -> String {
    format!("{}/{}/{}", CANONICAL_BASE, kind, id)
}

fn parse_uri(input: &str) -> Option<CatalogRef> {
    let rest = input.strip_prefix("spotify:")?;
    let (kind, id) = rest.split_once(':')?;
    catalog_ref(kind, id)
}

fn parse_url(input: &str) -> Option<CatalogRef> {
    let url = Url::parse(input)
        .ok()
        .or_else(|| Url::parse(&format!("https://{}", input)).ok())?;

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if host != SPOTIFY_DOMAIN && !host.ends_with(&format!(".{}", SPOTIFY_DOMAIN)) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    segments
        .windows(2)
        .find_map(|pair| catalog_ref(pair[0], pair[1]))
}

fn catalog_ref(kind: &str, id: &str) -> Option<CatalogRef> {
    let kind = CatalogKind::parse(kind)?;
    kind.is_valid_id(id).then(|| CatalogRef {
        kind,
        id: id.to_string(),
    })
}
