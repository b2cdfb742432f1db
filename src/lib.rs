use snafu::prelude::*;
#[macro_use]
extern crate tracing;

pub mod cli;
pub mod reconcile;
pub mod spotify;
pub mod track;
pub mod yandex;

pub const DEFAULT_PLAYLIST_NAME: &str = "Liked from Yandex Music";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Yandex Music: {error}"))]
    Yandex { error: yandex::Error },
    #[snafu(display("Spotify: {error}"))]
    Spotify { error: spotify::Error },
    #[snafu(display(
        "Failed to add {count} tracks to playlist {playlist} ({added} already added): {error}"
    ))]
    Flush {
        playlist: String,
        count: usize,
        added: usize,
        error: Box<Error>,
    },
}

impl From<spotify::Error> for Error {
    fn from(error: spotify::Error) -> Self {
        Error::Spotify { error }
    }
}

impl From<yandex::Error> for Error {
    fn from(error: yandex::Error) -> Self {
        Error::Yandex { error }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
