use crate::{
    client::{
        account::AccountStatus,
        likes::{LikesResult, TrackShort},
        track::Track,
        Envelope, ErrorEnvelope, Id,
    },
    Error, Result, DEFAULT_BASE_URL,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT},
    Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Number of full tracks requested per call to the tracks endpoint.
pub const TRACKS_PER_REQUEST: usize = 250;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    client: reqwest::Client,
}

pub fn new(token: String, base_url: Option<String>, timeout: Option<Duration>) -> Result<Client> {
    if token.trim().is_empty() {
        return Err(Error::NoToken);
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(format!("OAuth {}", token.trim()).as_str()).map_err(|_| {
            Error::Api {
                message: "token contains characters that are not allowed in a header".to_string(),
            }
        })?,
    );
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static("Yandex-Music-API"),
    );
    headers.insert(
        "X-Yandex-Music-Client",
        HeaderValue::from_static("YandexMusicAndroid/24023621"),
    );

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .build()?;

    let base_url = base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    Ok(Client { base_url, client })
}

#[non_exhaustive]
enum Endpoint {
    AccountStatus,
    LikedTracks { uid: String },
    Tracks,
}

impl Endpoint {
    fn path(&self) -> String {
        match self {
            Endpoint::AccountStatus => "account/status".to_string(),
            Endpoint::LikedTracks { uid } => format!("users/{uid}/likes/tracks"),
            Endpoint::Tracks => "tracks".to_string(),
        }
    }
}

macro_rules! call {
    ($self:ident, $method:expr, $endpoint:expr, $params:expr) => {{
        let response = $self.make_call($method, $endpoint, $params).await?;
        $self.unwrap_result(response.as_str())
    }};
}

impl Client {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retrieve the account the token belongs to
    pub async fn account_status(&self) -> Result<AccountStatus> {
        call!(self, Method::GET, Endpoint::AccountStatus, None)
    }

    /// Retrieve the user's liked tracks, most recent first
    pub async fn liked_tracks(&self, uid: &Id) -> Result<Vec<TrackShort>> {
        let endpoint = Endpoint::LikedTracks {
            uid: uid.to_string(),
        };
        let params = vec![("if-modified-since-revision", "0".to_string())];

        let likes: LikesResult = call!(self, Method::GET, endpoint, Some(params))?;

        Ok(likes.library.tracks)
    }

    /// Retrieve full track information, keeping the order of `ids`
    pub async fn tracks(&self, ids: &[TrackShort]) -> Result<Vec<Track>> {
        let mut all_tracks: Vec<Track> = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(TRACKS_PER_REQUEST) {
            let track_ids = chunk
                .iter()
                .map(TrackShort::track_id)
                .collect::<Vec<String>>()
                .join(",");

            debug!("fetching {} tracks", chunk.len());

            let params = vec![
                ("track-ids", track_ids),
                ("with-positions", "false".to_string()),
            ];

            let mut tracks: Vec<Track> = call!(self, Method::POST, Endpoint::Tracks, Some(params))?;
            all_tracks.append(&mut tracks);
        }

        Ok(all_tracks)
    }

    // Call the api and retrieve the JSON payload
    async fn make_call(
        &self,
        method: Method,
        endpoint: Endpoint,
        params: Option<Vec<(&str, String)>>,
    ) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint.path());

        debug!("calling {} {}", method, url);

        let is_post = method == Method::POST;
        let request = self.client.request(method, url);
        let request = match params {
            Some(p) if is_post => request.form(&p),
            Some(p) => request.query(&p),
            None => request,
        };

        let response = request.send().await?;
        self.handle_response(response).await
    }

    // Handle a response retrieved from the api
    async fn handle_response(&self, response: Response) -> Result<String> {
        match response.status() {
            StatusCode::OK => Ok(response.text().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthorized),
            StatusCode::NOT_FOUND => Err(Error::NotFound),
            status => {
                let body = response.text().await.unwrap_or_default();

                match serde_json::from_str::<ErrorEnvelope>(body.as_str()) {
                    Ok(envelope) => Err(Error::Api {
                        message: envelope.error.to_string(),
                    }),
                    Err(_) => Err(Error::Api {
                        message: format!("unexpected status {status}"),
                    }),
                }
            }
        }
    }

    fn unwrap_result<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
        match serde_json::from_str::<Envelope<T>>(body) {
            Ok(envelope) => Ok(envelope.result),
            Err(error) => Err(Error::DeserializeJSON {
                message: error.to_string(),
            }),
        }
    }
}
