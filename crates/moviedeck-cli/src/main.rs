//! moviedeck - TMDB movie browser CLI.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, AppPaths};
use moviedeck_api::auth::{Authenticator, Authorization, FileCredentialStore, LocalAuthentication};
use moviedeck_api::model::{MovieListItem, Paginated};
use moviedeck_api::tmdb::{
    AccountActions, DiscoverFilters, LocalAccountActionsApi, LocalCompanySearchApi,
    LocalDiscoverApi, LocalGenreApi, LocalMovieDetailApi, LocalMovieSearchApi,
    LocalPersonSearchApi, SortBy, SortField, SortOrder, TmdbClient,
};

/// Environment variable overriding the configured API key.
const API_KEY_ENV: &str = "TMDB_API_KEY";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Browse discovery feeds.
    Discover(DiscoverCommand),
    /// Search movies, people or companies.
    Search(SearchCommand),
    /// List movie genres.
    Genres,
    /// Movie details and related listings.
    Movie(MovieCommand),
    /// Sign in to TMDB and manage the session.
    Auth(AuthCommand),
    /// Manage the watchlist.
    Watchlist(WatchlistCommand),
    /// Mark or unmark favorites.
    Favorite(FavoriteCommand),
    /// Rate a movie.
    Rate(RateArgs),
    /// Remove a movie rating.
    Unrate(MovieIdArgs),
}

/// Arguments for the `discover` subcommand.
#[derive(clap::Args)]
struct DiscoverCommand {
    /// Discover subcommand to run.
    #[command(subcommand)]
    command: DiscoverSubcommands,
}

/// Available discovery feeds.
#[derive(Subcommand)]
enum DiscoverSubcommands {
    /// Movies now in theatres.
    NowPlaying(PageArgs),
    /// Latest releases with at least 10 votes.
    Latest(PageArgs),
    /// Upcoming releases.
    Upcoming(PageArgs),
    /// Popular movies.
    Popular(PageArgs),
    /// Top rated movies.
    TopRated(PageArgs),
    /// Movies matching filters.
    Filter(FilterArgs),
}

/// Page selection.
#[derive(clap::Args)]
struct PageArgs {
    /// Page number (starts at 1).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Sort keys accepted by `discover filter`.
#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Popularity,
    ReleaseDate,
    Revenue,
    OriginalTitle,
    VoteAverage,
    VoteCount,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Popularity => Self::Popularity,
            SortArg::ReleaseDate => Self::ReleaseDate,
            SortArg::Revenue => Self::Revenue,
            SortArg::OriginalTitle => Self::OriginalTitle,
            SortArg::VoteAverage => Self::VoteAverage,
            SortArg::VoteCount => Self::VoteCount,
        }
    }
}

/// Sort directions accepted by `discover filter`.
#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => Self::Asc,
            OrderArg::Desc => Self::Desc,
        }
    }
}

/// Arguments for `discover filter`.
#[derive(clap::Args)]
struct FilterArgs {
    /// Comma-separated genre IDs that must all match (e.g. "28,12").
    #[arg(long, value_delimiter = ',')]
    genres: Vec<u64>,
    /// Comma-separated genre IDs to exclude.
    #[arg(long, value_delimiter = ',')]
    exclude_genres: Vec<u64>,
    /// Comma-separated person IDs.
    #[arg(long, value_delimiter = ',')]
    people: Vec<u64>,
    /// Comma-separated company IDs.
    #[arg(long, value_delimiter = ',')]
    companies: Vec<u64>,
    /// Minimum vote average.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=10))]
    vote_min: u8,
    /// Maximum vote average.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=10))]
    vote_max: u8,
    /// Minimum vote count.
    #[arg(long, default_value_t = 0)]
    min_votes: u32,
    /// First release year.
    #[arg(long)]
    year_from: Option<i32>,
    /// Last release year.
    #[arg(long)]
    year_to: Option<i32>,
    /// Minimum runtime in minutes.
    #[arg(long, default_value_t = 0)]
    runtime_min: u32,
    /// Maximum runtime in minutes.
    #[arg(long, default_value_t = 9999)]
    runtime_max: u32,
    /// Sort key.
    #[arg(long, value_enum, default_value = "popularity")]
    sort: SortArg,
    /// Sort direction.
    #[arg(long, value_enum, default_value = "desc")]
    order: OrderArg,
    /// Page number (starts at 1).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

impl FilterArgs {
    fn to_filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            genres: self.genres.clone(),
            exclude_genres: self.exclude_genres.clone(),
            people: self.people.clone(),
            companies: self.companies.clone(),
            vote_average_min: self.vote_min,
            vote_average_max: self.vote_max,
            min_vote_count: self.min_votes,
            release_year_from: self.year_from,
            release_year_to: self.year_to,
            runtime_min: self.runtime_min,
            runtime_max: self.runtime_max,
            sort_by: SortBy::new(self.sort.into(), self.order.into()),
        }
    }
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchCommand {
    /// Search subcommand to run.
    #[command(subcommand)]
    command: SearchSubcommands,
}

/// Available search kinds.
#[derive(Subcommand)]
enum SearchSubcommands {
    /// Search movies.
    Movie(SearchArgs),
    /// Search people.
    Person(SearchArgs),
    /// Search companies.
    Company(SearchArgs),
}

/// Arguments for a keyword search.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search keyword (e.g. "Fight Club").
    #[arg(long, required = true)]
    query: String,
    /// Page number (starts at 1).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `movie` subcommand.
#[derive(clap::Args)]
struct MovieCommand {
    /// Movie subcommand to run.
    #[command(subcommand)]
    command: MovieSubcommands,
}

/// Available movie subcommands.
#[derive(Subcommand)]
enum MovieSubcommands {
    /// Full details with videos and images.
    Details(MovieIdArgs),
    /// Cast and crew.
    Credits(MovieIdArgs),
    /// Recommendations based on a movie.
    Recommendations(MoviePageArgs),
    /// Similar movies.
    Similar(MoviePageArgs),
    /// Your favorite, watchlist and rating state (requires sign-in).
    State(MovieIdArgs),
}

/// Movie selection.
#[derive(clap::Args)]
struct MovieIdArgs {
    /// TMDB movie ID (e.g. 550).
    #[arg(long, required = true)]
    id: u64,
}

/// Movie and page selection.
#[derive(clap::Args)]
struct MoviePageArgs {
    /// TMDB movie ID (e.g. 550).
    #[arg(long, required = true)]
    id: u64,
    /// Page number (starts at 1).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `rate` subcommand.
#[derive(clap::Args)]
struct RateArgs {
    /// TMDB movie ID (e.g. 550).
    #[arg(long, required = true)]
    id: u64,
    /// Rating from 0 to 10.
    #[arg(long, required = true, value_parser = clap::value_parser!(u8).range(0..=10))]
    value: u8,
}

/// Arguments for the `auth` subcommand.
#[derive(clap::Args)]
struct AuthCommand {
    /// Auth subcommand to run.
    #[command(subcommand)]
    command: AuthSubcommands,
}

/// Available auth subcommands.
#[derive(Subcommand)]
enum AuthSubcommands {
    /// Request a token and open the approval page in the browser.
    Login,
    /// Exchange the approved token for a session.
    Complete,
    /// End the session and clear stored credentials.
    Logout,
    /// Show the current authentication phase.
    Status,
    /// Show the signed-in account.
    Account,
}

/// Arguments for the `watchlist` subcommand.
#[derive(clap::Args)]
struct WatchlistCommand {
    /// Watchlist subcommand to run.
    #[command(subcommand)]
    command: WatchlistSubcommands,
}

/// Available watchlist subcommands.
#[derive(Subcommand)]
enum WatchlistSubcommands {
    /// List the watchlist.
    List(PageArgs),
    /// Add a movie.
    Add(MovieIdArgs),
    /// Remove a movie.
    Remove(MovieIdArgs),
}

/// Arguments for the `favorite` subcommand.
#[derive(clap::Args)]
struct FavoriteCommand {
    /// Favorite subcommand to run.
    #[command(subcommand)]
    command: FavoriteSubcommands,
}

/// Available favorite subcommands.
#[derive(Subcommand)]
enum FavoriteSubcommands {
    /// Mark a movie as favorite.
    On(MovieIdArgs),
    /// Unmark a favorite.
    Off(MovieIdArgs),
}

/// Signed-in state machine backed by the credential files.
type FileAuthenticator = Authenticator<TmdbClient, FileCredentialStore>;

/// Builds a `TmdbClient` from the config file and `TMDB_API_KEY`.
///
/// # Errors
///
/// Returns an error if no API key is configured, the config cannot be read,
/// or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(dir: Option<&PathBuf>) -> Result<TmdbClient> {
    let config = AppConfig::load(&AppPaths::resolve(dir)?.config_file)?;
    let api_key = config
        .resolve_api_key(std::env::var(API_KEY_ENV).ok())
        .context("TMDB_API_KEY environment variable or [tmdb] api_key in config is required")?;

    TmdbClient::builder()
        .api_key(api_key)
        .locale(config.tmdb.locale())
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build TMDB client")
}

/// Builds the authentication state machine over the credential files.
///
/// # Errors
///
/// Returns an error if the client fails to build or the data directory
/// cannot be resolved.
fn build_authenticator(dir: Option<&PathBuf>) -> Result<FileAuthenticator> {
    let client = build_tmdb_client(dir)?;
    let paths = AppPaths::resolve(dir)?;
    Ok(Authenticator::new(client, FileCredentialStore::new(&paths.data_dir)))
}

/// Logs one page of movies.
fn log_movie_page(page: &Paginated<MovieListItem>) {
    tracing::info!(
        "Page {}/{} ({} results)",
        page.page,
        page.total_pages,
        page.total_results
    );
    tracing::info!("ID\tYear\tRating\tTitle");
    for movie in &page.items {
        tracing::info!(
            "{}\t{}\t{:.1}\t{}",
            movie.id,
            if movie.release_year.is_empty() {
                "-"
            } else {
                movie.release_year.as_str()
            },
            movie.rating,
            movie.title,
        );
    }
}

/// Runs a `discover` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_discover(command: &DiscoverSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_tmdb_client(dir)?;
    let page = match command {
        DiscoverSubcommands::NowPlaying(args) => client.now_playing(args.page).await,
        DiscoverSubcommands::Latest(args) => client.latest(args.page).await,
        DiscoverSubcommands::Upcoming(args) => client.upcoming(args.page).await,
        DiscoverSubcommands::Popular(args) => client.popular(args.page).await,
        DiscoverSubcommands::TopRated(args) => client.top_rated(args.page).await,
        DiscoverSubcommands::Filter(args) => {
            client.discover(&args.to_filters(), args.page).await
        }
    }
    .context("TMDB discovery request failed")?;

    log_movie_page(&page);
    Ok(())
}

/// Runs a `search` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_search(command: &SearchSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_tmdb_client(dir)?;
    match command {
        SearchSubcommands::Movie(args) => {
            let page = client
                .search_movies(&args.query, args.page)
                .await
                .context("TMDB search/movie request failed")?;
            log_movie_page(&page);
        }
        SearchSubcommands::Person(args) => {
            let page = client
                .search_people(&args.query, args.page)
                .await
                .context("TMDB search/person request failed")?;
            tracing::info!("Page {}/{}", page.page, page.total_pages);
            tracing::info!("ID\tDepartment\tName");
            for person in &page.items {
                tracing::info!(
                    "{}\t{}\t{}",
                    person.id,
                    person.known_for_department,
                    person.name
                );
            }
        }
        SearchSubcommands::Company(args) => {
            let page = client
                .search_companies(&args.query, args.page)
                .await
                .context("TMDB search/company request failed")?;
            tracing::info!("Page {}/{}", page.page, page.total_pages);
            tracing::info!("ID\tName");
            for company in &page.items {
                tracing::info!("{}\t{}", company.id, company.name);
            }
        }
    }
    Ok(())
}

/// Runs the `genres` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_genres(dir: Option<&PathBuf>) -> Result<()> {
    let client = build_tmdb_client(dir)?;
    let genres = client.genres().await.context("TMDB genre request failed")?;

    tracing::info!("ID\tName");
    for genre in &genres {
        tracing::info!("{}\t{}", genre.id, genre.name);
    }
    tracing::info!("Total: {} genres", genres.len());
    Ok(())
}

/// Runs a `movie` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_movie(command: &MovieSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    match command {
        MovieSubcommands::Details(args) => {
            let client = build_tmdb_client(dir)?;
            let movie = client
                .movie(args.id)
                .await
                .context("TMDB movie request failed")?;
            tracing::info!("ID: {}", movie.id);
            tracing::info!("Title: {}", movie.title);
            tracing::info!("Original Title: {}", movie.original_title);
            tracing::info!("Release Date: {}", movie.release_date);
            tracing::info!(
                "Runtime: {}",
                movie
                    .runtime
                    .map_or_else(|| String::from("-"), |m| format!("{m} min"))
            );
            tracing::info!("Rating: {:.1} ({} votes)", movie.vote_average, movie.vote_count);
            tracing::info!(
                "Genres: {}",
                movie
                    .genres
                    .iter()
                    .map(|g| g.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            tracing::info!("Overview: {}", movie.overview.as_deref().unwrap_or("-"));
            tracing::info!("Poster: {}", movie.poster_url);
            for video in &movie.videos {
                tracing::info!("Video: {} {}", video.name, video.url);
            }
            tracing::info!("Images: {}", movie.images.len());
        }
        MovieSubcommands::Credits(args) => {
            let client = build_tmdb_client(dir)?;
            let credits = client
                .credits(args.id)
                .await
                .context("TMDB credits request failed")?;
            tracing::info!("Cast:");
            for member in &credits.cast {
                tracing::info!("  {}\t{}\t{}", member.id, member.name, member.character);
            }
            tracing::info!("Crew:");
            for member in &credits.crew {
                tracing::info!("  {}\t{}\t{}", member.id, member.name, member.job);
            }
        }
        MovieSubcommands::Recommendations(args) => {
            let client = build_tmdb_client(dir)?;
            let page = client
                .recommendations(args.id, args.page)
                .await
                .context("TMDB recommendations request failed")?;
            log_movie_page(&page);
        }
        MovieSubcommands::Similar(args) => {
            let client = build_tmdb_client(dir)?;
            let page = client
                .similar(args.id, args.page)
                .await
                .context("TMDB similar request failed")?;
            log_movie_page(&page);
        }
        MovieSubcommands::State(args) => {
            let auth = build_authenticator(dir)?;
            let actions = AccountActions::new(auth.backend(), &auth);
            let state = actions
                .account_state(args.id)
                .await
                .context("TMDB account state request failed")?;
            tracing::info!("Favorite: {}", state.favorite);
            tracing::info!("Watchlist: {}", state.watchlist);
            tracing::info!(
                "Rating: {}",
                state
                    .rating
                    .map_or_else(|| String::from("-"), |r| r.to_string())
            );
        }
    }
    Ok(())
}

/// Runs an `auth` subcommand.
///
/// # Errors
///
/// Returns an error if the handshake step or the account request fails.
#[instrument(skip_all)]
async fn run_auth(command: &AuthSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let auth = build_authenticator(dir)?;
    match command {
        AuthSubcommands::Login => match auth.authenticate().await.context("sign-in failed")? {
            Authorization::AwaitingApproval(url) => {
                tracing::info!("Approve access in your browser: {url}");
                if let Err(e) = open::that(&url) {
                    tracing::warn!(error = %e, "failed to open browser");
                }
                tracing::info!("Then run `moviedeck auth complete`.");
            }
            Authorization::AlreadyAuthenticated => {
                tracing::info!("Already signed in.");
            }
        },
        AuthSubcommands::Complete => {
            let phase = auth
                .refresh_session()
                .await
                .context("session creation failed")?;
            tracing::info!("Status: {phase}");
        }
        AuthSubcommands::Logout => {
            auth.logout().await.context("sign-out failed")?;
            tracing::info!("Signed out.");
        }
        AuthSubcommands::Status => {
            tracing::info!("Status: {}", auth.phase().await);
        }
        AuthSubcommands::Account => {
            let account = auth
                .account_details()
                .await
                .context("TMDB account request failed")?;
            tracing::info!("ID: {}", account.id);
            tracing::info!("Username: {}", account.username);
        }
    }
    Ok(())
}

/// Runs a `watchlist` subcommand.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
#[instrument(skip_all)]
async fn run_watchlist(command: &WatchlistSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let auth = build_authenticator(dir)?;
    let actions = AccountActions::new(auth.backend(), &auth);
    match command {
        WatchlistSubcommands::List(args) => {
            let page = actions
                .watchlist(args.page)
                .await
                .context("TMDB watchlist request failed")?;
            log_movie_page(&page);
        }
        WatchlistSubcommands::Add(args) => {
            actions
                .add_to_watchlist(args.id)
                .await
                .context("failed to add to watchlist")?;
            tracing::info!("Added {} to the watchlist.", args.id);
        }
        WatchlistSubcommands::Remove(args) => {
            actions
                .remove_from_watchlist(args.id)
                .await
                .context("failed to remove from watchlist")?;
            tracing::info!("Removed {} from the watchlist.", args.id);
        }
    }
    Ok(())
}

/// Runs a `favorite` subcommand.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
#[instrument(skip_all)]
async fn run_favorite(command: &FavoriteSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let auth = build_authenticator(dir)?;
    let actions = AccountActions::new(auth.backend(), &auth);
    match command {
        FavoriteSubcommands::On(args) => {
            actions
                .favorite_on(args.id)
                .await
                .context("failed to mark favorite")?;
            tracing::info!("Marked {} as favorite.", args.id);
        }
        FavoriteSubcommands::Off(args) => {
            actions
                .favorite_off(args.id)
                .await
                .context("failed to unmark favorite")?;
            tracing::info!("Unmarked {} as favorite.", args.id);
        }
    }
    Ok(())
}

/// Runs the `rate` and `unrate` subcommands.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
#[instrument(skip_all)]
async fn run_rating(movie_id: u64, value: Option<u8>, dir: Option<&PathBuf>) -> Result<()> {
    let auth = build_authenticator(dir)?;
    let actions = AccountActions::new(auth.backend(), &auth);
    if let Some(value) = value {
        actions
            .rate(movie_id, value)
            .await
            .context("failed to rate movie")?;
        tracing::info!("Rated {movie_id}: {value}");
    } else {
        actions
            .unrate(movie_id)
            .await
            .context("failed to remove rating")?;
        tracing::info!("Removed rating of {movie_id}.");
    }
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Discover(cmd) => run_discover(&cmd.command, dir).await,
        Commands::Search(cmd) => run_search(&cmd.command, dir).await,
        Commands::Genres => run_genres(dir).await,
        Commands::Movie(cmd) => run_movie(&cmd.command, dir).await,
        Commands::Auth(cmd) => run_auth(&cmd.command, dir).await,
        Commands::Watchlist(cmd) => run_watchlist(&cmd.command, dir).await,
        Commands::Favorite(cmd) => run_favorite(&cmd.command, dir).await,
        Commands::Rate(args) => run_rating(args.id, Some(args.value), dir).await,
        Commands::Unrate(args) => run_rating(args.id, None, dir).await,
    }
}
