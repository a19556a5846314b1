use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserShort {
    pub pk: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    pub pk: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub external_id: Option<i64>,
    #[serde(default)]
    pub external_id_source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Hashtag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub media_count: Option<i64>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub display_artist: String,
    #[serde(default)]
    pub audio_cluster_id: Option<String>,
    #[serde(default)]
    pub artist_id: Option<String>,
    #[serde(default)]
    pub cover_artwork_uri: Option<String>,
    #[serde(default)]
    pub cover_artwork_thumbnail_uri: Option<String>,
    /// Progressive download URL of the audio.
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub highlight_start_times_in_ms: Vec<i64>,
    #[serde(default)]
    pub is_explicit: bool,
    #[serde(default)]
    pub has_lyrics: bool,
    #[serde(default)]
    pub duration_in_ms: Option<i64>,
}

/// One child of a carousel post.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Resource {
    pub pk: String,
    pub media_type: i64,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Media {
    pub pk: String,
    pub id: String,
    pub code: String,
    pub taken_at: DateTime<Utc>,
    /// 1 photo, 2 video, 8 carousel.
    pub media_type: i64,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    pub user: UserShort,
    #[serde(default)]
    pub caption_text: String,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub play_count: Option<i64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// A row of the flat top-search result list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TopSearchItem {
    User(UserShort),
    Hashtag(Hashtag),
    Place(Location),
    Unknown(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecentEntry {
    User(UserShort),
    Hashtag(Hashtag),
    /// Passed through as sent: usually a string, sometimes an object.
    Keyword(serde_json::Value),
    Unknown(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecentSearch {
    /// Epoch seconds the search was made, when the server reports it.
    pub client_time: Option<i64>,
    pub entry: RecentEntry,
}

impl RecentSearch {
    pub fn client_time_utc(&self) -> Option<DateTime<Utc>> {
        self.client_time
            .and_then(|t| Utc.timestamp_opt(t, 0).single())
    }
}

// HTTP surface types

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlacesRequest {
    pub query: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestedRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebTopRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsResponse<T> {
    pub count: usize,
    pub results: Vec<T>,
}

impl<T> From<Vec<T>> for ResultsResponse<T> {
    fn from(results: Vec<T>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
