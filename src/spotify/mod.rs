pub mod auth;
pub mod client;
pub mod gateway;
pub mod models;

pub use auth::TokenProvider;
pub use client::SpotifyClient;
pub use gateway::CatalogGateway;
pub use models::{
    Album, Artist, ArtistRef, Image, Page, SearchKind, SearchRequest, SearchResults, Track,
    TrackStub,
};
