use crate::{
    reconcile::Reconciler,
    spotify::{self, SpotifyConfig, DEFAULT_REDIRECT_URI},
    yandex, Result, DEFAULT_PLAYLIST_NAME,
};
use clap::Parser;
use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "YAM2SPOT_LOG";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Transfer liked tracks from Yandex Music to Spotify", long_about = None)]
pub struct Cli {
    /// Token for Yandex Music authorization
    #[clap(long = "ymtoken", env = "YANDEX_MUSIC_TOKEN", hide_env_values = true)]
    pub yandex_token: String,

    /// Client ID for Spotify authorization
    #[clap(long = "spclientid", env = "RSPOTIFY_CLIENT_ID")]
    pub spotify_client_id: String,

    /// Client secret for Spotify authorization
    #[clap(long = "spclientsecret", env = "RSPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: String,

    /// Username for Spotify authorization
    #[clap(long = "spusername", env = "SPOTIFY_USERNAME")]
    pub spotify_username: String,

    /// Name for the playlist in Spotify
    #[clap(long = "playlistname", default_value = DEFAULT_PLAYLIST_NAME)]
    pub playlist_name: String,

    /// Redirect uri registered for the Spotify app. Must point at localhost.
    #[clap(long, env = "RSPOTIFY_REDIRECT_URI", default_value = DEFAULT_REDIRECT_URI)]
    pub redirect_uri: String,

    /// Seconds to wait for a single API request
    #[clap(long, default_value_t = 5)]
    pub timeout: u64,

    /// How many times a Spotify request is retried after a timeout, a 429 or a 5xx
    #[clap(long, default_value_t = 5)]
    pub retries: u32,

    /// Yandex Music API base url
    #[clap(long, env = "YANDEX_MUSIC_API_URL", hide = true)]
    pub yandex_api_url: Option<String>,
}

fn spinner(prefix: &'static str) -> ProgressBar {
    let prog = ProgressBar::new_spinner().with_prefix(prefix);
    prog.enable_steady_tick(Duration::from_millis(250));
    prog.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    prog
}

/// `YAM2SPOT_LOG` when set, otherwise info for this crate and warnings for the
/// rest. Misses and step timings are logged at warn and info.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn,yam2spot=info"))
}

fn seconds(since: Instant) -> f64 {
    since.elapsed().as_secs_f64()
}

pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_file(false)
                .with_writer(std::io::stderr),
        )
        .with(log_filter())
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    let term = Term::stdout();
    let draw_target = ProgressDrawTarget::term(term, 15);
    let prog = MultiProgress::with_draw_target(draw_target);

    println!("\nStarting\n");
    let started = Instant::now();

    // YANDEX MUSIC
    let yandex_prog = prog.add(spinner("yandex "));
    yandex_prog.set_message("authorizing");

    let step = Instant::now();
    let yandex = yandex::login(cli.yandex_token, cli.yandex_api_url, timeout).await?;
    info!(
        "Yandex Music authorization successful, time taken: {:.2} seconds",
        seconds(step)
    );

    yandex_prog.set_message("fetching liked tracks");
    let step = Instant::now();
    let tracks = yandex.liked_tracks().await?;
    info!(
        "Fetched {} liked tracks from Yandex Music, time taken: {:.2} seconds",
        tracks.len(),
        seconds(step)
    );
    yandex_prog.finish_with_message(format!("{} liked tracks", tracks.len()));

    // SPOTIFY
    let spotify_prog = prog.add(spinner("spotify"));
    spotify_prog.set_message("waiting for authorization in the browser");

    let mut spotify = spotify::new(SpotifyConfig {
        client_id: cli.spotify_client_id,
        client_secret: cli.spotify_client_secret,
        username: cli.spotify_username,
        redirect_uri: cli.redirect_uri,
        request_timeout: timeout,
        retries: cli.retries,
        retry_backoff: spotify::DEFAULT_RETRY_BACKOFF,
    });
    spotify.authorize().await?;

    let user_id = spotify.current_user_id().await?;
    info!("Spotify authorization successful as {user_id}");

    spotify_prog.set_message(format!("creating playlist \"{}\"", cli.playlist_name));
    let step = Instant::now();
    let playlist = spotify
        .create_playlist(&user_id, &cli.playlist_name)
        .await?;
    info!(
        "Created playlist {playlist} in Spotify, time taken: {:.2} seconds",
        seconds(step)
    );
    spotify_prog.finish_with_message(format!("playlist {playlist}"));

    // SYNC
    let progress = prog.add(ProgressBar::new(tracks.len() as u64).with_prefix("syncing"));
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} {wide_bar:.cyan/blue} [{pos}/{len}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let summary = Reconciler::new(&spotify)
        .with_progress(progress.clone())
        .run(&playlist, &tracks)
        .await?;

    progress.finish_and_clear();

    println!(
        "Added {} found liked tracks to Spotify playlist ({} not found), time taken: {:.2} seconds\n",
        summary.added,
        summary.misses.len(),
        summary.elapsed.as_secs_f64()
    );
    println!("Finished, total time taken: {:.2} seconds", seconds(started));

    Ok(())
}
