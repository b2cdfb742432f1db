use snafu::prelude::*;
use std::{fmt::Display, str::FromStr};

pub const SEPARATOR: &str = " - ";

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum Error {
    #[snafu(display("\"{entry}\" has no \"{SEPARATOR}\" between artist and title"))]
    MissingSeparator { entry: String },
    #[snafu(display("\"{entry}\" has an empty artist or title"))]
    EmptyPart { entry: String },
}

/// A liked track from the source service, in `Artist - Title` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikedTrack {
    pub artist: String,
    pub title: String,
}

impl LikedTrack {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    pub fn query(&self) -> SearchQuery {
        SearchQuery(format!("artist:{} track:{}", self.artist, self.title))
    }
}

impl FromStr for LikedTrack {
    type Err = Error;

    /// Splits on the first separator only, so a title may itself contain
    /// `" - "`.
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let (artist, title) =
            entry
                .split_once(SEPARATOR)
                .context(MissingSeparatorSnafu {
                    entry: entry.to_string(),
                })?;

        let (artist, title) = (artist.trim(), title.trim());

        ensure!(
            !artist.is_empty() && !title.is_empty(),
            EmptyPartSnafu {
                entry: entry.to_string()
            }
        );

        Ok(LikedTrack::new(artist, title))
    }
}

impl Display for LikedTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.artist, SEPARATOR, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A destination-native track identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackUri(pub String);

impl Display for TrackUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaylistRef(pub String);

impl Display for PlaylistRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_artist_and_title() {
        let track: LikedTrack = "Queen - Bohemian Rhapsody".parse().expect("parse");

        assert_eq!(track, LikedTrack::new("Queen", "Bohemian Rhapsody"));
        assert_eq!(track.to_string(), "Queen - Bohemian Rhapsody");
    }

    #[test]
    fn splits_on_first_separator_only() {
        let track: LikedTrack = "Daft Punk - Harder - Better (Live)".parse().expect("parse");

        assert_eq!(track.artist, "Daft Punk");
        assert_eq!(track.title, "Harder - Better (Live)");
    }

    #[test]
    fn hyphen_without_spaces_is_not_a_separator() {
        assert_eq!(
            "Jay-Z".parse::<LikedTrack>(),
            Err(Error::MissingSeparator {
                entry: "Jay-Z".to_string()
            })
        );
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!(matches!(
            " - Title".parse::<LikedTrack>(),
            Err(Error::EmptyPart { .. })
        ));
        assert!(matches!(
            "Artist -  ".parse::<LikedTrack>(),
            Err(Error::EmptyPart { .. })
        ));
    }

    #[test]
    fn builds_field_filtered_query() {
        let query = LikedTrack::new("Queen", "Bohemian Rhapsody").query();

        assert_eq!(query.as_str(), "artist:Queen track:Bohemian Rhapsody");
    }
}
