use crate::models::Video;
use crate::providers::traits::VideoProvider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Datelike, SecondsFormat, Utc};
use reqwest::Client;
use std::collections::HashMap;

use super::models::*;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub struct YouTubeProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: YOUTUBE_API_BASE.to_string(),
        }
    }

    fn build_search_url(&self, term: &str, max_results: u32, prefer_new: bool) -> String {
        let mut url = format!(
            "{}/search?part=snippet&type=video&q={}&maxResults={}&key={}",
            self.base_url,
            urlencoding::encode(term),
            max_results,
            self.api_key
        );

        // Restrict to the last three years but keep relevance ordering.
        if prefer_new {
            let now = Utc::now();
            let cutoff = now
                .with_year(now.year() - 3)
                .unwrap_or(now - chrono::Duration::days(3 * 365));
            url.push_str(&format!(
                "&publishedAfter={}",
                urlencoding::encode(&cutoff.to_rfc3339_opts(SecondsFormat::Secs, true))
            ));
        }

        url
    }

    async fn fetch_stats(&self, video_ids: &[String]) -> Result<HashMap<String, VideoItem>> {
        let url = format!(
            "{}/videos?part=statistics,contentDetails&id={}&key={}",
            self.base_url,
            video_ids.join(","),
            self.api_key
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("stats request failed with HTTP {}", response.status()));
        }

        let data: VideosResponse = response.json().await?;
        Ok(data.items.into_iter().map(|item| (item.id.clone(), item)).collect())
    }

    fn map_results(search: SearchResponse, mut stats: HashMap<String, VideoItem>) -> Vec<Video> {
        let mut videos = Vec::new();

        for item in search.items {
            let Some(video_id) = item.id.video_id else {
                continue;
            };
            let snippet = item.snippet;

            let thumbnail_url = snippet
                .thumbnails
                .high
                .or(snippet.thumbnails.medium)
                .or(snippet.thumbnails.default)
                .map(|t| t.url)
                .unwrap_or_default();

            let (view_count, like_count, duration) = match stats.remove(&video_id) {
                Some(entry) => {
                    let statistics = entry.statistics;
                    let view_count = statistics
                        .as_ref()
                        .and_then(|s| s.view_count.as_deref())
                        .and_then(|v| v.parse().ok());
                    let like_count = statistics
                        .as_ref()
                        .and_then(|s| s.like_count.as_deref())
                        .and_then(|v| v.parse().ok());
                    let duration = entry.content_details.and_then(|c| c.duration);
                    (view_count, like_count, duration)
                }
                None => (None, None, None),
            };

            videos.push(Video {
                id: video_id,
                title: snippet.title,
                description: snippet.description,
                thumbnail_url,
                channel_name: snippet.channel_title,
                channel_id: snippet.channel_id,
                published_at: snippet.published_at,
                view_count,
                like_count,
                duration,
            });
        }

        videos
    }
}

#[async_trait]
impl VideoProvider for YouTubeProvider {
    fn id(&self) -> &str {
        "youtube"
    }

    fn name(&self) -> &str {
        "YouTube"
    }

    async fn search(&self, term: &str, max_results: u32, prefer_new: bool) -> Result<Vec<Video>> {
        if self.api_key.is_empty() {
            return Err(anyhow!("YouTube API key is not configured"));
        }

        let url = self.build_search_url(term, max_results, prefer_new);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("YouTube API error ({}): {}", status, body);
            return Err(anyhow!("YouTube search failed with HTTP {}", status));
        }

        let search: SearchResponse = response.json().await?;

        let video_ids: Vec<String> = search
            .items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect();

        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Statistics are decoration. If the second call fails the search
        // still succeeds with the base snippet data.
        let stats = match self.fetch_stats(&video_ids).await {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Video stats lookup failed, returning base results: {}", e);
                HashMap::new()
            }
        };

        Ok(Self::map_results(search, stats))
    }
}
