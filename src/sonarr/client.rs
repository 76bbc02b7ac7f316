//! HTTP client for the Sonarr v3 API

use crate::config::SonarrConfig;
use crate::error::{Result, SweeparrError};
use crate::sonarr::types::{EpisodeResource, SeriesResource};
use reqwest::{Client, Method, RequestBuilder, Response};

/// Header carrying the Sonarr API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Thin Sonarr API client
///
/// No timeout or retry is configured: each call blocks its caller until the
/// remote answers or the connection fails.
///
/// # Examples
///
/// ```no_run
/// use sweeparr::config::SonarrConfig;
/// use sweeparr::sonarr::SonarrClient;
///
/// # async fn example() -> sweeparr::error::Result<()> {
/// let config = SonarrConfig {
///     url: "http://localhost:8989".to_string(),
///     api_key: "secret".to_string(),
/// };
/// let client = SonarrClient::new(reqwest::Client::new(), &config);
/// let series = client.find_series("Foo").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SonarrClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SonarrClient {
    /// Build a client for the given connection settings
    pub fn new(http: Client, config: &SonarrConfig) -> Self {
        Self {
            http,
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| SweeparrError::Sonarr(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SweeparrError::Sonarr(format!(
                "{} returned {}: {}",
                what,
                status,
                body.trim()
            ))
            .into());
        }

        Ok(response)
    }

    /// `GET /api/v3/series`
    pub async fn series(&self) -> Result<Vec<SeriesResource>> {
        let what = "GET /api/v3/series";
        let response = self
            .send(self.request(Method::GET, "/api/v3/series"), what)
            .await?;
        response
            .json()
            .await
            .map_err(|e| SweeparrError::Sonarr(format!("{}: invalid response: {}", what, e)).into())
    }

    /// `GET /api/v3/episode?seriesId={series_id}`
    pub async fn episodes(&self, series_id: i64) -> Result<Vec<EpisodeResource>> {
        let what = "GET /api/v3/episode";
        let builder = self
            .request(Method::GET, "/api/v3/episode")
            .query(&[("seriesId", series_id)]);
        let response = self.send(builder, what).await?;
        response
            .json()
            .await
            .map_err(|e| SweeparrError::Sonarr(format!("{}: invalid response: {}", what, e)).into())
    }

    /// `DELETE /api/v3/episodefile/{file_id}`
    ///
    /// # Errors
    ///
    /// Returns an error on a connection failure or a non-2xx status.
    pub async fn delete_episode_file(&self, file_id: i64) -> Result<()> {
        let path = format!("/api/v3/episodefile/{}", file_id);
        let what = format!("DELETE {}", path);
        self.send(self.request(Method::DELETE, &path), &what).await?;
        Ok(())
    }

    /// `PUT /api/v3/episode/{id}` with the full episode object
    pub async fn update_episode(&self, episode: &EpisodeResource) -> Result<()> {
        let path = format!("/api/v3/episode/{}", episode.id);
        let what = format!("PUT {}", path);
        self.send(self.request(Method::PUT, &path).json(episode), &what)
            .await?;
        Ok(())
    }

    /// First series whose title equals `title` ignoring case
    ///
    /// # Returns
    ///
    /// `Ok(None)` when Sonarr answers but knows no such series
    ///
    /// # Errors
    ///
    /// Returns [`SweeparrError::Sonarr`](crate::error::SweeparrError::Sonarr)
    /// on a connection failure, a non-2xx status, or an undecodable body.
    pub async fn find_series(&self, title: &str) -> Result<Option<SeriesResource>> {
        let wanted = title.to_lowercase();
        Ok(self
            .series()
            .await?
            .into_iter()
            .find(|s| s.title.to_lowercase() == wanted))
    }

    /// First episode of `series_id` with the given season and episode numbers
    pub async fn find_episode(
        &self,
        series_id: i64,
        season: i64,
        episode: i64,
    ) -> Result<Option<EpisodeResource>> {
        Ok(self
            .episodes(series_id)
            .await?
            .into_iter()
            .find(|e| e.season_number == season && e.episode_number == episode))
    }
}
