use crate::track::SEPARATOR;
use snafu::prelude::*;
use std::time::Duration;
use yam2spot_yandex_api::client::{
    api::{self, Client},
    track::Track,
    Id,
};

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("{error}"))]
    ClientError { error: String },
    #[snafu(display("The account has no uid, cannot look up its likes"))]
    MissingUid,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<yam2spot_yandex_api::Error> for Error {
    fn from(error: yam2spot_yandex_api::Error) -> Self {
        Error::ClientError {
            error: error.to_string(),
        }
    }
}

pub struct Yandex {
    client: Client,
    uid: Id,
}

/// Check the token against the account endpoint and remember whose likes to
/// fetch.
pub async fn login(token: String, base_url: Option<String>, timeout: Duration) -> Result<Yandex> {
    let client = api::new(token, base_url, Some(timeout))?;
    let status = client.account_status().await?;

    let uid = status.account.uid.context(MissingUidSnafu)?;

    if let Some(login) = &status.account.login {
        info!("logged in to Yandex Music as {login}");
    }

    Ok(Yandex { client, uid })
}

impl Yandex {
    /// Liked tracks as `Artist - Title`, most recently liked first.
    pub async fn liked_tracks(&self) -> Result<Vec<String>> {
        let likes = self.client.liked_tracks(&self.uid).await?;
        debug!("account {} has {} likes", self.uid, likes.len());

        let tracks = self.client.tracks(&likes).await?;

        Ok(render(&tracks))
    }
}

/// Render tracks the way the reconciler expects them. Only the first artist
/// is kept.
pub fn render(tracks: &[Track]) -> Vec<String> {
    tracks
        .iter()
        .filter_map(|track| match track.first_artist() {
            Some(artist) => Some(format!("{}{}{}", artist.name, SEPARATOR, track.title)),
            None => {
                warn!("skipping \"{}\", it has no artist", track.title);
                None
            }
        })
        .collect::<Vec<String>>()
}
