use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use trackrank::lookup::{AlbumLookup, ArtistLookup, TrackLookup};
use trackrank::spotify::{SearchKind, SearchResults};
use trackrank::{
    CatalogKind, Config, LookupResult, LookupService, RankedCollection, Resolution, SpotifyClient,
    Track, canonical_url, server,
};

/// How many collection entries the terminal output lists.
const DISPLAY_LIMIT: usize = 10;

#[derive(Parser)]
#[command(name = "trackrank")]
#[command(about = "Rank Spotify tracks within their album and their artist's catalog")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the lookup HTTP API
    Serve {
        /// Address to listen on (or set TRACKRANK_BIND_ADDR env var)
        #[arg(long, env = "TRACKRANK_BIND_ADDR")]
        addr: Option<String>,
    },

    /// Look up a Spotify link, or search for free text
    Lookup {
        /// A track, album or artist link, or a search query
        input: String,
    },

    /// Search the Spotify catalog
    Search {
        /// Search text
        query: String,

        /// Restrict to these kinds (track, album, artist)
        #[arg(long = "type", value_delimiter = ',')]
        kinds: Vec<String>,

        /// Maximum results per kind
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { addr } => serve(addr).await?,
        Commands::Lookup { input } => lookup(&input).await?,
        Commands::Search {
            query,
            kinds,
            limit,
        } => search(&query, &kinds, limit).await?,
        Commands::Setup => show_setup_guide(),
    }

    Ok(())
}

fn build_service() -> Result<(Config, LookupService<SpotifyClient>)> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let missing = config.get_missing_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        println!(
            "\n{}",
            "Run `trackrank setup` for instructions.".yellow()
        );
        std::process::exit(1);
    }

    let client = SpotifyClient::new(&config).context("Failed to create Spotify client")?;
    let service = LookupService::new(client, config.max_concurrency);
    Ok((config, service))
}

async fn serve(addr: Option<String>) -> Result<()> {
    let (config, service) = build_service()?;
    let addr = addr.unwrap_or(config.bind_addr);

    println!("{}", "Track Rank".cyan().bold());
    println!("Serving lookups on http://{}", addr);

    server::serve(Arc::new(service), &addr)
        .await
        .context("Server stopped")?;
    Ok(())
}

async fn lookup(input: &str) -> Result<()> {
    let (_, service) = build_service()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Resolving...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let resolution = service.resolve(input).await;
    spinner.finish_and_clear();

    match resolution.context("Lookup failed")? {
        Resolution::Lookup(LookupResult::Track(lookup)) => print_track(&lookup),
        Resolution::Lookup(LookupResult::Album(lookup)) => print_album(&lookup),
        Resolution::Lookup(LookupResult::Artist(lookup)) => print_artist(&lookup),
        Resolution::Search(results) => print_search(&results),
    }

    Ok(())
}

async fn search(query: &str, kinds: &[String], limit: u32) -> Result<()> {
    let kinds = kinds
        .iter()
        .map(|k| SearchKind::parse(k).with_context(|| format!("Unknown search type '{}'", k)))
        .collect::<Result<Vec<_>>>()?;

    let (_, service) = build_service()?;
    let results = service
        .search(query, &kinds, limit, 0)
        .await
        .context("Search failed")?;

    print_search(&results);
    Ok(())
}

fn artist_names(track: &Track) -> String {
    track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_collection(collection: &RankedCollection, focal_id: Option<&str>) {
    for (i, track) in collection.tracks().iter().take(DISPLAY_LIMIT).enumerate() {
        let line = format!(
            "{:3}. {} - {} ({})",
            i + 1,
            track.name,
            artist_names(track),
            track.popularity
        );
        if Some(track.id.as_str()) == focal_id {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
    if collection.len() > DISPLAY_LIMIT {
        println!("     ... {} more", collection.len() - DISPLAY_LIMIT);
    }
}

fn print_track(lookup: &TrackLookup) {
    let track = &lookup.track;
    println!("{}", track.name.cyan().bold());
    println!("{}", artist_names(track));
    println!("Popularity: {}", track.popularity);

    let album_name = track.album.as_ref().map(|a| a.name.as_str()).unwrap_or("");
    match lookup.track_rank {
        Some(rank) => println!(
            "\nRanks {} of {} on {}",
            format!("#{}", rank).green().bold(),
            lookup.total_tracks,
            album_name
        ),
        None => println!("\nNot found among the tracks of {}", album_name),
    }
    print_collection(&lookup.album_tracks, Some(&track.id));

    if let Some(top_tracks) = &lookup.artist_top_tracks {
        match lookup.artist_track_rank {
            Some(rank) => println!(
                "\nRanks {} of the artist's top {} tracks",
                format!("#{}", rank).green().bold(),
                top_tracks.len()
            ),
            None => println!(
                "\n{}",
                format!("Outside the artist's top {} tracks", top_tracks.len()).yellow()
            ),
        }
        print_collection(top_tracks, Some(&track.id));
    }
}

fn print_album(lookup: &AlbumLookup) {
    println!("{}", lookup.album.name.cyan().bold());
    println!(
        "Released {} - {} tracks",
        lookup.album.release_date, lookup.album.total_tracks
    );
    println!();
    print_collection(&lookup.album_tracks, None);
}

fn print_artist(lookup: &ArtistLookup) {
    let artist = &lookup.artist;
    println!("{}", artist.name.cyan().bold());
    println!("Followers: {}", artist.followers.total);
    if !artist.genres.is_empty() {
        println!("Genres: {}", artist.genres.join(", "));
    }
    println!("\nTop {} tracks:", lookup.top_tracks.len());
    print_collection(&lookup.top_tracks, None);
}

fn print_search(results: &SearchResults) {
    if let Some(tracks) = &results.tracks {
        println!("{}", "Tracks".yellow());
        for track in &tracks.items {
            println!(
                "  {} - {}  {}",
                track.name,
                artist_names(track),
                canonical_url(CatalogKind::Track, &track.id).dimmed()
            );
        }
    }
    if let Some(artists) = &results.artists {
        println!("{}", "Artists".yellow());
        for artist in &artists.items {
            println!(
                "  {}  {}",
                artist.name,
                canonical_url(CatalogKind::Artist, &artist.id).dimmed()
            );
        }
    }
    if let Some(albums) = &results.albums {
        println!("{}", "Albums".yellow());
        for album in &albums.items {
            println!(
                "  {} ({})  {}",
                album.name,
                album.release_date,
                canonical_url(CatalogKind::Album, &album.id).dimmed()
            );
        }
    }
}

fn show_setup_guide() {
    println!("{}", "Track Rank Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");

    println!("\n{}", "2. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("   - Optional:");
    println!("     TRACKRANK_BIND_ADDR=127.0.0.1:3000");
    println!("     TRACKRANK_MAX_CONCURRENCY=8");
    println!("     TRACKRANK_REQUEST_TIMEOUT_SECS=10");

    println!("\n{}", "3. Usage".yellow());
    println!("   - trackrank lookup https://open.spotify.com/track/<id>");
    println!("   - trackrank search \"song title\" --type track,artist");
    println!("   - trackrank serve   (GET /api/lookup?url=..., /api/search?q=...)");

    println!("\n{}", "Ready to rank!".green());
}
