use snafu::prelude::*;

#[macro_use]
extern crate log;

pub mod client;

pub const DEFAULT_BASE_URL: &str = "https://api.music.yandex.net";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("No token provided."))]
    NoToken,
    #[snafu(display("The token was rejected by Yandex Music."))]
    Unauthorized,
    #[snafu(display("Item not found."))]
    NotFound,
    #[snafu(display("Request timed out."))]
    Timeout,
    #[snafu(display("{message}"))]
    Api { message: String },
    #[snafu(display("Failed to deserialize json: {message}"))]
    DeserializeJSON { message: String },
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Error::Timeout;
        }

        match error.status() {
            Some(status) => Error::Api {
                message: status.to_string(),
            },
            None => Error::Api {
                message: format!("Error calling the API: {error}"),
            },
        }
    }
}
