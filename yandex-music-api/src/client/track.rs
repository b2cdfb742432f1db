use crate::client::Id;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: Id,
    pub title: String,
    pub version: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub albums: Vec<Album>,
    pub available: Option<bool>,
    pub duration_ms: Option<i64>,
}

impl Track {
    pub fn first_artist(&self) -> Option<&Artist> {
        self.artists.first()
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub various: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: Option<Id>,
    pub title: Option<String>,
    pub year: Option<i64>,
}
