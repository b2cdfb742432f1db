use crate::{
    track::{LikedTrack, PlaylistRef, SearchQuery, TrackUri},
    Error, Result,
};
use async_trait::async_trait;
use indicatif::ProgressBar;
use snafu::prelude::*;
use std::{
    fmt::Display,
    time::{Duration, Instant},
};

/// Most identifiers the destination accepts in a single add-items call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Why a search did not produce a track.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum SearchFailure {
    #[snafu(display("no match found"))]
    NoMatch,
    #[snafu(display("request timed out"))]
    Timeout,
    #[snafu(display("{message}"))]
    Unknown { message: String },
}

/// The two calls the reconciler needs from the destination service.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Resolve a query to the first matching track.
    async fn search_track(&self, query: &SearchQuery) -> Result<TrackUri, SearchFailure>;
    /// Append `items` to the playlist. Never called with more than
    /// [`MAX_BATCH_SIZE`] items or with none.
    async fn add_items(&self, playlist: &PlaylistRef, items: &[TrackUri]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    Malformed,
    NoMatch,
    Timeout,
    Unknown(String),
}

impl From<SearchFailure> for MissReason {
    fn from(failure: SearchFailure) -> Self {
        match failure {
            SearchFailure::NoMatch => MissReason::NoMatch,
            SearchFailure::Timeout => MissReason::Timeout,
            SearchFailure::Unknown { message } => MissReason::Unknown(message),
        }
    }
}

impl Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissReason::Malformed => f.write_str("malformed entry"),
            MissReason::NoMatch => f.write_str("no match"),
            MissReason::Timeout => f.write_str("timeout"),
            MissReason::Unknown(message) => write!(f, "unknown error: {message}"),
        }
    }
}

/// An input entry that did not make it into the playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    pub entry: String,
    pub reason: MissReason,
    /// Time since the run started.
    pub at: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Identifiers passed to the destination across every add-items call.
    pub added: usize,
    pub flushes: usize,
    pub misses: Vec<Miss>,
    pub elapsed: Duration,
}

/// Accumulates matched tracks until there are enough for one add-items call.
#[derive(Debug, Default)]
pub struct Batch {
    items: Vec<TrackUri>,
}

impl Batch {
    /// Returns true once the batch is full and must be flushed.
    pub fn push(&mut self, uri: TrackUri) -> bool {
        debug_assert!(self.items.len() < MAX_BATCH_SIZE);

        self.items.push(uri);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_BATCH_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn take(&mut self) -> Vec<TrackUri> {
        std::mem::take(&mut self.items)
    }
}

pub struct Reconciler<'d, D: Destination> {
    destination: &'d D,
    progress: ProgressBar,
}

impl<'d, D: Destination> Reconciler<'d, D> {
    pub fn new(destination: &'d D) -> Self {
        Self {
            destination,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Searches for every entry in order and adds the matches to `playlist`.
    ///
    /// Search failures of any kind are logged and recorded in the summary.
    /// A failed add-items call stops the run.
    pub async fn run(&self, playlist: &PlaylistRef, tracks: &[String]) -> Result<Summary> {
        let started = Instant::now();
        let mut batch = Batch::default();
        let mut summary = Summary::default();

        self.progress.set_length(tracks.len() as u64);
        info!("Adding {} liked tracks to playlist {playlist}", tracks.len());

        for entry in tracks {
            self.progress.inc(1);

            let track = match entry.parse::<LikedTrack>() {
                Ok(track) => track,
                Err(error) => {
                    warn!("Skipping malformed entry: {error}");
                    summary.misses.push(Miss {
                        entry: entry.clone(),
                        reason: MissReason::Malformed,
                        at: started.elapsed(),
                    });
                    continue;
                }
            };

            let query = track.query();
            debug!("searching for {query}");

            match self.destination.search_track(&query).await {
                Ok(uri) => {
                    if batch.push(uri) {
                        self.flush(playlist, &mut batch, &mut summary).await?;
                    }
                }
                Err(failure) => {
                    let elapsed = started.elapsed().as_secs_f64();

                    match &failure {
                        SearchFailure::NoMatch => {
                            warn!("Failed to add {track} to the playlist. Time: {elapsed:.2} seconds")
                        }
                        SearchFailure::Timeout => warn!(
                            "Failed to add {track} to the playlist, the search timed out. Time: {elapsed:.2} seconds"
                        ),
                        SearchFailure::Unknown { message } => warn!(
                            "Failed to add {track} to the playlist, unknown error occurred ({message}). Time: {elapsed:.2} seconds"
                        ),
                    }

                    summary.misses.push(Miss {
                        entry: entry.clone(),
                        reason: failure.into(),
                        at: started.elapsed(),
                    });
                }
            }
        }

        if !batch.is_empty() {
            self.flush(playlist, &mut batch, &mut summary).await?;
        }

        summary.elapsed = started.elapsed();

        info!(
            "Added {} found liked tracks to playlist {playlist}, time taken: {:.2} seconds",
            summary.added,
            summary.elapsed.as_secs_f64()
        );

        Ok(summary)
    }

    async fn flush(
        &self,
        playlist: &PlaylistRef,
        batch: &mut Batch,
        summary: &mut Summary,
    ) -> Result<()> {
        let items = batch.take();
        let count = items.len();

        if let Err(error) = self.destination.add_items(playlist, &items).await {
            error!("Failed to add a batch of {count} tracks to playlist {playlist}");

            return Err(Error::Flush {
                playlist: playlist.to_string(),
                count,
                added: summary.added,
                error: Box::new(error),
            });
        }

        summary.added += count;
        summary.flushes += 1;
        info!("Added a batch of {count} tracks to the playlist");

        Ok(())
    }
}
