use crate::client::Id;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikesResult {
    pub library: Library,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub uid: Option<Id>,
    pub revision: Option<i64>,
    #[serde(default)]
    pub tracks: Vec<TrackShort>,
}

/// A liked track as returned by the likes endpoint: just enough to look up
/// the full track.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackShort {
    pub id: Id,
    pub album_id: Option<Id>,
    pub timestamp: Option<String>,
}

impl TrackShort {
    /// The `id:album_id` form the tracks endpoint expects.
    pub fn track_id(&self) -> String {
        match &self.album_id {
            Some(album_id) => format!("{}:{}", self.id, album_id),
            None => self.id.to_string(),
        }
    }
}
