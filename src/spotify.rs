use crate::{
    reconcile::{Destination, SearchFailure, MAX_BATCH_SIZE},
    track::{PlaylistRef, SearchQuery, TrackUri},
};
use async_trait::async_trait;
use rspotify::{
    http::HttpError,
    model::{PlayableId, PlaylistId, SearchResult, SearchType, TrackId, UserId},
    prelude::*,
    scopes, AuthCodeSpotify, ClientError, ClientResult, Config, Credentials as SpotifyCredentials,
    OAuth,
};
use snafu::prelude::*;
use std::{
    collections::HashMap, fmt::Display, future::Future, net::SocketAddr, time::Duration,
};
use tokio::sync::oneshot;
use warp::{http::StatusCode, path::FullPath, Filter};

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";

/// First wait before retrying a rate limited or failed request. Doubles on
/// every retry unless the response carries `Retry-After`.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("{error}"))]
    ClientError { error: String },
    #[snafu(display("Request to Spotify timed out"))]
    Timeout,
    #[snafu(display("Redirect uri {uri} must point at localhost"))]
    RedirectUri { uri: String },
    #[snafu(display("Authorization failed: {reason}"))]
    AuthorizationDenied { reason: String },
    #[snafu(display("Callback server on {addr} failed: {error}"))]
    CallbackServer { addr: SocketAddr, error: String },
    #[snafu(display("Invalid id {id}"))]
    InvalidId { id: String },
    #[snafu(display("A batch of {count} tracks is over the limit of {MAX_BATCH_SIZE}"))]
    BatchTooLarge { count: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<rspotify::ClientError> for Error {
    fn from(error: rspotify::ClientError) -> Self {
        Error::ClientError {
            error: error.to_string(),
        }
    }
}

/// Why a single request attempt failed.
#[derive(Debug)]
enum Failure {
    Timeout,
    Client(ClientError),
}

impl Failure {
    /// How long to wait before trying again, or `None` when retrying can't
    /// help.
    fn retry_delay(&self, backoff: Duration, attempt: u32) -> Option<Duration> {
        let backoff = backoff.saturating_mul(2u32.saturating_pow(attempt));

        match self {
            Failure::Timeout => Some(Duration::ZERO),
            Failure::Client(ClientError::Http(http)) => match &**http {
                HttpError::Client(error) if error.is_timeout() => Some(Duration::ZERO),
                HttpError::StatusCode(response) => match response.status().as_u16() {
                    429 => Some(
                        response
                            .headers()
                            .get("retry-after")
                            .and_then(|value| value.to_str().ok())
                            .and_then(|value| value.trim().parse::<u64>().ok())
                            .map(Duration::from_secs)
                            .unwrap_or(backoff),
                    ),
                    500..=599 => Some(backoff),
                    _ => None,
                },
                _ => None,
            },
            Failure::Client(_) => None,
        }
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Timeout => f.write_str("request timed out"),
            Failure::Client(error) => write!(f, "{error}"),
        }
    }
}

impl From<Failure> for SearchFailure {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Timeout => SearchFailure::Timeout,
            Failure::Client(ClientError::Http(http)) => match *http {
                HttpError::Client(ref error) if error.is_timeout() => SearchFailure::Timeout,
                other => SearchFailure::Unknown {
                    message: other.to_string(),
                },
            },
            Failure::Client(other) => SearchFailure::Unknown {
                message: other.to_string(),
            },
        }
    }
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Timeout => Error::Timeout,
            Failure::Client(error) => error.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub redirect_uri: String,
    pub request_timeout: Duration,
    pub retries: u32,
    pub retry_backoff: Duration,
}

pub struct Spotify {
    client: AuthCodeSpotify,
    username: String,
    redirect_uri: String,
    request_timeout: Duration,
    retries: u32,
    retry_backoff: Duration,
}

pub fn new(config: SpotifyConfig) -> Spotify {
    let creds = SpotifyCredentials::new(&config.client_id, &config.client_secret);

    let oauth = OAuth {
        redirect_uri: config.redirect_uri.clone(),
        scopes: scopes!("playlist-modify-public", "playlist-modify-private"),
        ..Default::default()
    };

    let client_config = Config {
        token_refreshing: true,
        ..Default::default()
    };

    Spotify {
        client: AuthCodeSpotify::with_config(creds, oauth, client_config),
        username: config.username,
        redirect_uri: config.redirect_uri,
        request_timeout: config.request_timeout,
        retries: config.retries,
        retry_backoff: config.retry_backoff,
    }
}

impl Spotify {
    /// Run the authorization code flow: open the consent page in a browser and
    /// catch the redirect on a local server.
    pub async fn authorize(&mut self) -> Result<()> {
        let url = self.client.get_authorize_url(false)?;
        let (addr, path) = callback_addr(&self.redirect_uri)?;

        let server = CallbackServer::start(addr, path)?;

        if webbrowser::open(&url).is_ok() {
            info!("opened the Spotify authorization page in your browser");
        } else {
            println!("Open this url in your browser to authorize:\n\n{url}\n");
        }

        let code = server.wait().await?;
        self.client.request_token(&code).await?;

        Ok(())
    }

    pub async fn current_user_id(&self) -> Result<String> {
        let user = self
            .request("current user", || self.client.current_user())
            .await?;
        let user_id = user.id.id().to_string();

        if user_id != self.username {
            warn!(
                "authorized as {user_id} but the configured username is {}",
                self.username
            );
        }

        Ok(user_id)
    }

    /// Create a public playlist owned by `user_id`.
    pub async fn create_playlist(&self, user_id: &str, name: &str) -> Result<PlaylistRef> {
        let user = UserId::from_id(user_id).map_err(|_| Error::InvalidId {
            id: user_id.to_string(),
        })?;

        let playlist = self
            .request("create playlist", || {
                self.client
                    .user_playlist_create(user.clone(), name, Some(true), Some(false), None)
            })
            .await?;

        Ok(PlaylistRef(playlist.id.id().to_string()))
    }

    /// Run `call` under the request timeout, retrying transient failures up to
    /// `retries` times.
    async fn request<T, F, Fut>(&self, what: &str, call: F) -> Result<T, Failure>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut attempt = 0;

        loop {
            let failure = match tokio::time::timeout(self.request_timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) => Failure::Client(error),
                Err(_) => Failure::Timeout,
            };

            match failure.retry_delay(self.retry_backoff, attempt) {
                Some(delay) if attempt < self.retries => {
                    attempt += 1;
                    debug!(
                        "{what} failed ({failure}), retry {attempt}/{} in {:.2} seconds",
                        self.retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => return Err(failure),
            }
        }
    }
}

#[async_trait]
impl Destination for Spotify {
    async fn search_track(&self, query: &SearchQuery) -> Result<TrackUri, SearchFailure> {
        let result = self
            .request("search", || {
                self.client
                    .search(query.as_str(), SearchType::Track, None, None, Some(1), None)
            })
            .await?;

        match result {
            SearchResult::Tracks(page) => page
                .items
                .into_iter()
                .next()
                .and_then(|track| track.id)
                .map(|id| TrackUri(id.uri()))
                .ok_or(SearchFailure::NoMatch),
            _ => Err(SearchFailure::Unknown {
                message: "search returned something other than tracks".to_string(),
            }),
        }
    }

    async fn add_items(&self, playlist: &PlaylistRef, items: &[TrackUri]) -> crate::Result<()> {
        if items.len() > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge { count: items.len() }.into());
        }

        let playlist_id = PlaylistId::from_id(&playlist.0).map_err(|_| Error::InvalidId {
            id: playlist.0.clone(),
        })?;

        let ids = items
            .iter()
            .map(|uri| {
                TrackId::from_uri(&uri.0).map_err(|_| Error::InvalidId { id: uri.0.clone() })
            })
            .collect::<Result<Vec<TrackId>>>()?;

        self.request("add items", || {
            self.client.playlist_add_items(
                playlist_id.clone(),
                ids.iter().cloned().map(PlayableId::Track),
                None,
            )
        })
        .await
        .map_err(Error::from)?;

        Ok(())
    }
}

/// The local address and path the redirect uri points at.
pub fn callback_addr(redirect_uri: &str) -> Result<(SocketAddr, String)> {
    let invalid = || Error::RedirectUri {
        uri: redirect_uri.to_string(),
    };

    let url = url::Url::parse(redirect_uri).map_err(|_| invalid())?;

    match url.host_str() {
        Some("localhost") | Some("127.0.0.1") => {}
        _ => return Err(invalid()),
    }

    let port = url.port_or_known_default().ok_or_else(invalid)?;

    Ok((SocketAddr::from(([127, 0, 0, 1], port)), url.path().to_string()))
}

/// One-shot HTTP server that waits for the OAuth redirect.
pub struct CallbackServer {
    addr: SocketAddr,
    codes: flume::Receiver<Result<String>>,
    shutdown: oneshot::Sender<()>,
}

impl CallbackServer {
    pub fn start(addr: SocketAddr, path: String) -> Result<CallbackServer> {
        let (tx, codes) = flume::bounded::<Result<String>>(1);
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let callback = warp::get()
            .and(warp::path::full())
            .and(warp::query::<HashMap<String, String>>())
            .map(move |full: FullPath, params: HashMap<String, String>| {
                if full.as_str() != path {
                    return warp::reply::with_status(
                        warp::reply::html("Not found"),
                        StatusCode::NOT_FOUND,
                    );
                }

                let outcome = match (params.get("code"), params.get("error")) {
                    (Some(code), _) => Ok(code.clone()),
                    (None, Some(reason)) => Err(Error::AuthorizationDenied {
                        reason: reason.clone(),
                    }),
                    (None, None) => Err(Error::AuthorizationDenied {
                        reason: "the redirect carried no code".to_string(),
                    }),
                };

                let page = if outcome.is_ok() {
                    "yam2spot is authorized, you can close this window."
                } else {
                    "Authorization failed, check the terminal for details."
                };

                if tx.try_send(outcome).is_err() {
                    debug!("ignoring repeated callback");
                }

                warp::reply::with_status(warp::reply::html(page), StatusCode::OK)
            });

        let (addr, server) = warp::serve(callback)
            .try_bind_with_graceful_shutdown(addr, async move {
                shutdown_rx.await.ok();
            })
            .map_err(|error| Error::CallbackServer {
                addr,
                error: error.to_string(),
            })?;

        debug!("waiting for the authorization callback on {addr}");
        tokio::spawn(server);

        Ok(CallbackServer {
            addr,
            codes,
            shutdown,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the redirect and stop the server.
    pub async fn wait(self) -> Result<String> {
        let outcome = self
            .codes
            .recv_async()
            .await
            .map_err(|error| Error::CallbackServer {
                addr: self.addr,
                error: error.to_string(),
            });

        self.shutdown.send(()).ok();

        outcome?
    }
}
