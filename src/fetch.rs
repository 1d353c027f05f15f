//! Source API adapter.
//!
//! Fetches artist payloads from the upstream catalog API using OAuth
//! client-credentials. Tokens are cached until shortly before expiry; a
//! single 401 triggers one forced refresh and retry.

use crate::config::SourceApiSettings;
use crate::error::{FetchError, IngestError};
use crate::ingest::ArtistIngestor;
use crate::payload::ArtistPayload;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tokens are treated as expired this long before their advertised expiry,
/// so a request never goes out with a token about to lapse mid-flight.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Anything that can produce a full artist payload for an id.
pub trait ArtistSource: Send + Sync {
    fn fetch_artist(&self, artist_id: &str) -> Result<ArtistPayload, FetchError>;
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_usable(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

pub struct SourceApiClient {
    http: Client,
    settings: SourceApiSettings,
    token: Mutex<Option<CachedToken>>,
}

impl SourceApiClient {
    pub fn new(settings: SourceApiSettings) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            settings,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid bearer token, requesting a fresh one when the cached
    /// token is missing or close to expiry.
    ///
    /// The cache mutex is held across the refresh request on purpose:
    /// concurrent callers wait for the single in-flight refresh instead of
    /// each hitting the token endpoint with its own request.
    fn bearer_token(&self) -> Result<String, FetchError> {
        let mut cached = self
            .token
            .lock()
            .map_err(|_| FetchError::Token("token cache poisoned".to_string()))?;

        if let Some(token) = cached.as_ref() {
            if token.is_usable() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting fresh access token");
        let response = self
            .http
            .post(&self.settings.token_url)
            .basic_auth(&self.settings.client_id, Some(&self.settings.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Token(format!(
                "token endpoint returned status {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response.json()?;
        let lifetime = body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let access_token = body.access_token.clone();
        *cached = Some(CachedToken {
            access_token: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        Ok(access_token)
    }

    fn invalidate_token(&self) {
        if let Ok(mut cached) = self.token.lock() {
            *cached = None;
        }
    }

    fn get_artist(&self, artist_id: &str) -> Result<reqwest::blocking::Response, FetchError> {
        let token = self.bearer_token()?;
        let url = format!("{}/artists/{}", self.settings.api_base_url, artist_id);
        Ok(self.http.get(&url).bearer_auth(token).send()?)
    }
}

impl ArtistSource for SourceApiClient {
    fn fetch_artist(&self, artist_id: &str) -> Result<ArtistPayload, FetchError> {
        let mut response = self.get_artist(artist_id)?;

        // A 401 usually means the cached token was revoked early. Retry
        // exactly once with a forced refresh.
        if response.status().as_u16() == 401 {
            debug!("Got 401 for artist {}, refreshing token", artist_id);
            self.invalidate_token();
            response = self.get_artist(artist_id)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                resource: format!("artist {artist_id}"),
            });
        }

        Ok(response.json()?)
    }
}

/// Outcome of one fetch-and-store cycle.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub artist_id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Pulls fresh payloads from an [`ArtistSource`] and feeds them through the
/// ingestor, pacing between artists.
pub struct ArtistUpdater {
    source: Box<dyn ArtistSource>,
    ingestor: ArtistIngestor,
    pacing: Duration,
}

impl ArtistUpdater {
    pub fn new(source: Box<dyn ArtistSource>, ingestor: ArtistIngestor, pacing: Duration) -> Self {
        Self {
            source,
            ingestor,
            pacing,
        }
    }

    pub fn fetch_and_store(&self, artist_id: &str) -> UpdateOutcome {
        match self.try_update(artist_id) {
            Ok(()) => {
                info!("Updated artist {}", artist_id);
                UpdateOutcome {
                    artist_id: artist_id.to_string(),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Update of artist {} failed: {}", artist_id, e);
                UpdateOutcome {
                    artist_id: artist_id.to_string(),
                    success: false,
                    error: Some(e),
                }
            }
        }
    }

    fn try_update(&self, artist_id: &str) -> Result<(), String> {
        let payload = self
            .source
            .fetch_artist(artist_id)
            .map_err(|e| e.to_string())?;
        let report = self
            .ingestor
            .ingest_artist(&payload)
            .map_err(|e: IngestError| e.to_string())?;
        if !report.is_clean() {
            warn!(
                "Artist {} updated with {} section failures",
                report.artist_id,
                report.failure_count()
            );
        }
        Ok(())
    }

    /// Update a list of artists, isolated per id.
    pub fn update_artists(&self, artist_ids: &[String]) -> Vec<UpdateOutcome> {
        let mut outcomes = Vec::with_capacity(artist_ids.len());
        for (index, artist_id) in artist_ids.iter().enumerate() {
            if index > 0 {
                thread::sleep(self.pacing);
            }
            outcomes.push(self.fetch_and_store(artist_id));
        }
        outcomes
    }
}
