use async_trait::async_trait;
use std::{
    collections::HashMap,
    io::Write,
    sync::{Arc, Mutex},
};
use yam2spot::{
    reconcile::{Destination, SearchFailure},
    spotify,
    track::{PlaylistRef, SearchQuery, TrackUri},
    Error, Result,
};

pub const PLAYLIST: &str = "37i9dQZF1DXcBWIGoYBM5M";

/// Destination that matches every query unless told otherwise and records
/// every call it receives.
#[derive(Default)]
pub struct FakeDestination {
    overrides: HashMap<String, SearchFailure>,
    fail_add_call: Option<usize>,
    pub searches: Mutex<Vec<String>>,
    pub add_calls: Mutex<Vec<Vec<TrackUri>>>,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_search(mut self, query: &str, failure: SearchFailure) -> Self {
        self.overrides.insert(query.to_string(), failure);
        self
    }

    /// Make the n-th add-items call (starting at 1) fail.
    pub fn failing_add_call(mut self, call: usize) -> Self {
        self.fail_add_call = Some(call);
        self
    }

    pub fn add_calls(&self) -> Vec<Vec<TrackUri>> {
        self.add_calls.lock().expect("poisoned").clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.add_calls().iter().map(Vec::len).collect()
    }

    pub fn added(&self) -> Vec<TrackUri> {
        self.add_calls().into_iter().flatten().collect()
    }
}

pub fn uri_for(query: &str) -> TrackUri {
    TrackUri(format!("uri:{query}"))
}

#[async_trait]
impl Destination for FakeDestination {
    async fn search_track(&self, query: &SearchQuery) -> Result<TrackUri, SearchFailure> {
        self.searches
            .lock()
            .expect("poisoned")
            .push(query.to_string());

        match self.overrides.get(query.as_str()) {
            Some(failure) => Err(failure.clone()),
            None => Ok(uri_for(query.as_str())),
        }
    }

    async fn add_items(&self, _playlist: &PlaylistRef, items: &[TrackUri]) -> Result<()> {
        let mut calls = self.add_calls.lock().expect("poisoned");

        if self.fail_add_call == Some(calls.len() + 1) {
            return Err(Error::Spotify {
                error: spotify::Error::ClientError {
                    error: "playlist is gone".to_string(),
                },
            });
        }

        calls.push(items.to_vec());
        Ok(())
    }
}

pub fn playlist() -> PlaylistRef {
    PlaylistRef(PLAYLIST.to_string())
}

/// `count` well formed entries, `Artist N - Title N`.
pub fn liked(count: usize) -> Vec<String> {
    (0..count)
        .map(|n| format!("Artist {n} - Title {n}"))
        .collect()
}

pub fn query(artist: &str, title: &str) -> String {
    format!("artist:{artist} track:{title}")
}

/// Collects formatted log lines while its guard is alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().expect("poisoned"))
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
