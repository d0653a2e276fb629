pub mod classifier;
pub mod collection;
pub mod config;
pub mod error;
pub mod lookup;
pub mod rank;
pub mod server;
pub mod spotify;

pub use classifier::{CatalogKind, CatalogRef, Classification, canonical_url, classify};
pub use collection::{AlbumCollection, CollectionResolver};
pub use config::Config;
pub use error::{AppError, Result};
pub use lookup::{LookupResult, LookupService, Resolution};
pub use rank::{Rank, RankedCollection, rank};
pub use spotify::{CatalogGateway, SpotifyClient, Track};
