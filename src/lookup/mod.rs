pub mod orchestrator;
pub mod result;

pub use orchestrator::LookupService;
pub use result::{AlbumLookup, ArtistLookup, LookupResult, Resolution, TrackLookup};
