use crate::config::{SessionContext, DEFAULT_WEB_DOMAIN};
use crate::error::{Result, SearchError};
use crate::extract::*;
use crate::transport::{Params, Transport};
use crate::types::*;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Default coordinates used by the places search when the caller has none.
pub const DEFAULT_LAT: f64 = 40.74;
pub const DEFAULT_LNG: f64 = -73.94;
pub const SEARCH_COUNT: u32 = 30;

/// Search operations over a [`Transport`], with the session values they need.
#[derive(Debug, Clone)]
pub struct SearchClient<T> {
    pub(crate) transport: T,
    pub(crate) session: SessionContext,
    pub(crate) web_domain: String,
}

/// Look up `field` on a response and require it to be a list.
pub(crate) fn list_field<'a>(
    response: &'a Value,
    context: &'static str,
    field: &'static str,
) -> Result<&'a Vec<Value>> {
    response
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::missing(context, field))
}

fn nested<'a>(item: &'a Value, context: &'static str, field: &'static str) -> Result<&'a Value> {
    item.get(field)
        .ok_or_else(|| SearchError::missing(context, field))
}

/// Decode a flat top-search row: first of `user`, `hashtag`, `place` wins.
pub(crate) fn decode_top_search_item(item: &Value) -> Result<TopSearchItem> {
    if let Some(user) = item.get("user") {
        return Ok(TopSearchItem::User(extract_user_short(user)?));
    }
    if let Some(hashtag) = item.get("hashtag") {
        return Ok(TopSearchItem::Hashtag(extract_hashtag_v1(hashtag)?));
    }
    if let Some(place) = item.get("place") {
        let location = place.get("location").unwrap_or(place);
        return Ok(TopSearchItem::Place(extract_location(location)?));
    }
    Ok(TopSearchItem::Unknown(item.clone()))
}

/// Decode one `recent` item into zero or more entries, checking `user`,
/// `hashtag`, `keyword` in that order. Items with none of them become `Unknown`.
pub(crate) fn decode_recent_item(item: &Value) -> Result<Vec<RecentSearch>> {
    let client_time = item.get("client_time").and_then(Value::as_i64);
    let mut out = Vec::new();
    if let Some(user) = item.get("user") {
        out.push(RecentSearch {
            client_time,
            entry: RecentEntry::User(extract_user_short(user)?),
        });
    }
    if let Some(hashtag) = item.get("hashtag") {
        out.push(RecentSearch {
            client_time,
            entry: RecentEntry::Hashtag(extract_recent_hashtag(hashtag)?),
        });
    }
    if let Some(keyword) = item.get("keyword") {
        out.push(RecentSearch {
            client_time,
            entry: RecentEntry::Keyword(keyword.clone()),
        });
    }
    if out.is_empty() {
        out.push(RecentSearch {
            client_time,
            entry: RecentEntry::Unknown(item.clone()),
        });
    }
    Ok(out)
}

impl<T: Transport> SearchClient<T> {
    pub fn new(transport: T, session: SessionContext) -> Self {
        Self {
            transport,
            session,
            web_domain: DEFAULT_WEB_DOMAIN.to_string(),
        }
    }

    /// Host used for the web top-search endpoint.
    pub fn with_web_domain(mut self, domain: impl Into<String>) -> Self {
        self.web_domain = domain.into();
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn surface_params(&self, surface: &str) -> Params {
        let mut params = Params::new();
        params.insert("search_surface".into(), surface.to_string());
        params.insert(
            "timezone_offset".into(),
            self.session.timezone_offset.to_string(),
        );
        params.insert("count".into(), SEARCH_COUNT.to_string());
        params
    }

    /// Search places around `lat`/`lng` (defaults to [`DEFAULT_LAT`], [`DEFAULT_LNG`]).
    pub async fn fbsearch_places(
        &self,
        query: &str,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<Vec<Location>> {
        info!("Searching places for: {}", query);
        let mut params = self.surface_params("places_search_page");
        params.insert("lat".into(), lat.unwrap_or(DEFAULT_LAT).to_string());
        params.insert("lng".into(), lng.unwrap_or(DEFAULT_LNG).to_string());
        params.insert("query".into(), query.to_string());

        let result = self
            .transport
            .private_request("fbsearch/places/", &params, None)
            .await?;
        let locations = list_field(&result, "places response", "items")?
            .iter()
            .map(|item| extract_location(nested(item, "places item", "location")?))
            .collect::<Result<Vec<_>>>()?;
        debug!("places search returned {} locations", locations.len());
        Ok(locations)
    }

    pub async fn fbsearch_topsearch_flat(&self, query: &str) -> Result<Vec<TopSearchItem>> {
        info!("Top search for: {}", query);
        let mut params = self.surface_params("top_search_page");
        params.insert("context".into(), "blended".into());
        params.insert("query".into(), query.to_string());

        let result = self
            .transport
            .private_request("fbsearch/topsearch_flat/", &params, None)
            .await?;
        list_field(&result, "top search response", "list")?
            .iter()
            .map(decode_top_search_item)
            .collect()
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserShort>> {
        info!("Searching users for: {}", query);
        let mut params = self.surface_params("user_search_page");
        params.insert("q".into(), query.to_string());

        let result = self
            .transport
            .private_request("users/search/", &params, None)
            .await?;
        list_field(&result, "user search response", "users")?
            .iter()
            .map(extract_user_short)
            .collect()
    }

    /// Every call sends a fresh `browse_session_id`.
    pub async fn search_music(&self, query: &str) -> Result<Vec<Track>> {
        info!("Searching music for: {}", query);
        let mut params = Params::new();
        params.insert("query".into(), query.to_string());
        params.insert("browse_session_id".into(), Uuid::new_v4().to_string());

        let result = self
            .transport
            .private_request("music/audio_global_search/", &params, None)
            .await?;
        list_field(&result, "music search response", "items")?
            .iter()
            .map(|item| extract_track(nested(item, "music item", "track")?))
            .collect()
    }

    pub async fn search_hashtags(&self, query: &str) -> Result<Vec<Hashtag>> {
        info!("Searching hashtags for: {}", query);
        let mut params = self.surface_params("hashtag_search_page");
        params.insert("q".into(), query.to_string());

        let result = self
            .transport
            .private_request("tags/search/", &params, None)
            .await?;
        list_field(&result, "hashtag search response", "results")?
            .iter()
            .map(extract_hashtag_v1)
            .collect()
    }

    pub async fn fbsearch_suggested_profiles(&self, user_id: &str) -> Result<Vec<UserShort>> {
        info!("Fetching suggested profiles for user {}", user_id);
        let mut params = Params::new();
        params.insert("target_user_id".into(), user_id.to_string());
        params.insert("include_friendship_status".into(), "true".into());

        let result = self
            .transport
            .private_request("fbsearch/accounts_recs/", &params, None)
            .await?;
        list_field(&result, "suggested profiles response", "users")?
            .iter()
            .map(extract_user_short)
            .collect()
    }

    /// Recently searched users, hashtags and keywords, newest first as the server orders them.
    pub async fn fbsearch_recent(&self) -> Result<Vec<RecentSearch>> {
        info!("Fetching recent searches");
        let result = self
            .transport
            .private_request("fbsearch/recent_searches/", &Params::new(), None)
            .await?;
        if result.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(SearchError::StatusGate(
                "Failed to retrieve recent searches".to_string(),
            ));
        }

        let mut data = Vec::new();
        if let Some(items) = result.get("recent").and_then(Value::as_array) {
            for item in items {
                data.extend(decode_recent_item(item)?);
            }
        }
        debug!("decoded {} recent searches", data.len());
        Ok(data)
    }
}
