//! Conversions from raw API JSON objects into the typed records in [`crate::types`].
//!
//! The remote API is loose about types: ids arrive as numbers or strings and counts
//! sometimes come pre-formatted. Each extractor normalizes those fields into a copy
//! of the object and lets serde build the record.

use crate::error::{Result, SearchError};
use crate::types::*;
use chrono::{TimeZone, Utc};
use serde_json::{Map, Value};

fn object<'a>(data: &'a Value, what: &'static str) -> Result<&'a Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| SearchError::missing(what, "<object>"))
}

fn non_null<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Ids come through as either JSON numbers or strings.
pub(crate) fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

/// Parse counts such as `"1,234"`, `"12.5K"` or `"3M posts"`. Only the first word is read.
pub(crate) fn parse_count(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .split_whitespace()
        .next()?
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let (digits, multiplier) = match cleaned.chars().last()? {
        'k' | 'K' => (&cleaned[..cleaned.len() - 1], 1_000f64),
        'm' | 'M' => (&cleaned[..cleaned.len() - 1], 1_000_000f64),
        'b' | 'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000f64),
        _ => (cleaned.as_str(), 1f64),
    };
    if multiplier == 1f64 {
        if let Ok(n) = digits.parse::<i64>() {
            return Some(n);
        }
    }
    digits
        .parse::<f64>()
        .ok()
        .map(|f| (f * multiplier).round() as i64)
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    non_null(obj, key).and_then(Value::as_str).map(str::to_string)
}

/// Largest entry of an `image_versions2.candidates` / `video_versions` style list.
fn best_url(candidates: Option<&Value>) -> Option<String> {
    candidates?
        .as_array()?
        .iter()
        .filter_map(|c| {
            let url = c.get("url")?.as_str()?;
            let w = c.get("width").and_then(Value::as_i64).unwrap_or(0);
            let h = c.get("height").and_then(Value::as_i64).unwrap_or(0);
            Some((w * h, url))
        })
        .max_by_key(|(area, _)| *area)
        .map(|(_, url)| url.to_string())
}

pub fn extract_user_short(data: &Value) -> Result<UserShort> {
    let obj = object(data, "user")?;
    let pk = non_null(obj, "id")
        .or_else(|| non_null(obj, "pk"))
        .and_then(id_to_string)
        .ok_or_else(|| SearchError::missing("user", "pk"))?;
    let mut obj = obj.clone();
    obj.insert("pk".into(), Value::String(pk));
    serde_json::from_value(Value::Object(obj)).map_err(|e| SearchError::decode("user", e))
}

pub fn extract_location(data: &Value) -> Result<Location> {
    let obj = object(data, "location")?;
    let mut out = obj.clone();
    let pk = non_null(obj, "id")
        .or_else(|| non_null(obj, "pk"))
        .and_then(lenient_i64);
    out.insert("pk".into(), pk.map(Value::from).unwrap_or(Value::Null));
    if let Some(fb_id) = non_null(obj, "facebook_places_id").and_then(lenient_i64) {
        out.insert("external_id".into(), Value::from(fb_id));
        out.insert("external_id_source".into(), Value::from("facebook_places"));
    }
    serde_json::from_value(Value::Object(out)).map_err(|e| SearchError::decode("location", e))
}

pub fn extract_hashtag_v1(data: &Value) -> Result<Hashtag> {
    let obj = object(data, "hashtag")?;
    let mut out = obj.clone();
    let id = non_null(obj, "id")
        .or_else(|| non_null(obj, "pk"))
        .and_then(id_to_string)
        .ok_or_else(|| SearchError::missing("hashtag", "id"))?;
    out.insert("id".into(), Value::String(id));
    let media_count = non_null(obj, "media_count").and_then(lenient_i64);
    out.insert(
        "media_count".into(),
        media_count.map(Value::from).unwrap_or(Value::Null),
    );
    serde_json::from_value(Value::Object(out)).map_err(|e| SearchError::decode("hashtag", e))
}

/// Recent-search hashtags report their count as `formatted_media_count`.
pub fn extract_recent_hashtag(data: &Value) -> Result<Hashtag> {
    let mut obj = object(data, "recent hashtag")?.clone();
    let count = obj
        .remove("formatted_media_count")
        .ok_or_else(|| SearchError::missing("recent hashtag", "formatted_media_count"))?;
    if !count.is_null() && lenient_i64(&count).is_none() {
        return Err(SearchError::missing("recent hashtag", "formatted_media_count"));
    }
    obj.insert("media_count".into(), count);
    extract_hashtag_v1(&Value::Object(obj))
}

pub fn extract_track(data: &Value) -> Result<Track> {
    let obj = object(data, "track")?;
    let mut out = obj.clone();
    let id = non_null(obj, "id")
        .and_then(id_to_string)
        .ok_or_else(|| SearchError::missing("track", "id"))?;
    out.insert("id".into(), Value::String(id));
    for key in ["audio_cluster_id", "artist_id"] {
        let v = non_null(obj, key).and_then(id_to_string);
        out.insert(key.into(), v.map(Value::String).unwrap_or(Value::Null));
    }
    out.insert(
        "uri".into(),
        string_field(obj, "progressive_download_url")
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    if non_null(obj, "highlight_start_times_in_ms").is_none() {
        out.insert("highlight_start_times_in_ms".into(), Value::Array(vec![]));
    }
    serde_json::from_value(Value::Object(out)).map_err(|e| SearchError::decode("track", e))
}

fn extract_resource(data: &Value) -> Result<Resource> {
    let obj = object(data, "carousel item")?;
    Ok(Resource {
        pk: non_null(obj, "pk")
            .and_then(id_to_string)
            .ok_or_else(|| SearchError::missing("carousel item", "pk"))?,
        media_type: non_null(obj, "media_type")
            .and_then(Value::as_i64)
            .ok_or_else(|| SearchError::missing("carousel item", "media_type"))?,
        thumbnail_url: best_url(obj.get("image_versions2").and_then(|v| v.get("candidates"))),
        video_url: best_url(obj.get("video_versions")),
    })
}

pub fn extract_media_v1(data: &Value) -> Result<Media> {
    let obj = object(data, "media")?;
    let pk = non_null(obj, "pk")
        .and_then(id_to_string)
        .ok_or_else(|| SearchError::missing("media", "pk"))?;
    let taken_at = non_null(obj, "taken_at")
        .and_then(Value::as_i64)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .ok_or_else(|| SearchError::missing("media", "taken_at"))?;
    let user = extract_user_short(
        non_null(obj, "user").ok_or_else(|| SearchError::missing("media", "user"))?,
    )?;
    let location = non_null(obj, "location")
        .map(extract_location)
        .transpose()?;
    let resources = match non_null(obj, "carousel_media").and_then(Value::as_array) {
        Some(items) => items.iter().map(extract_resource).collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Media {
        id: string_field(obj, "id").unwrap_or_else(|| pk.clone()),
        pk,
        code: string_field(obj, "code").ok_or_else(|| SearchError::missing("media", "code"))?,
        taken_at,
        media_type: non_null(obj, "media_type")
            .and_then(Value::as_i64)
            .ok_or_else(|| SearchError::missing("media", "media_type"))?,
        product_type: string_field(obj, "product_type").unwrap_or_default(),
        thumbnail_url: best_url(obj.get("image_versions2").and_then(|v| v.get("candidates"))),
        video_url: best_url(obj.get("video_versions")),
        user,
        caption_text: obj
            .get("caption")
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        like_count: non_null(obj, "like_count").and_then(lenient_i64).unwrap_or(0),
        comment_count: non_null(obj, "comment_count").and_then(lenient_i64).unwrap_or(0),
        play_count: non_null(obj, "play_count")
            .or_else(|| non_null(obj, "view_count"))
            .and_then(lenient_i64),
        location,
        resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_pk_prefers_id_and_accepts_numbers() {
        let user = extract_user_short(&json!({
            "id": "42", "pk": 7, "username": "alice", "full_name": "Alice A"
        }))
        .unwrap();
        assert_eq!(user.pk, "42");
        assert_eq!(user.username, "alice");

        let user = extract_user_short(&json!({"pk": 7, "username": "bob"})).unwrap();
        assert_eq!(user.pk, "7");
        assert_eq!(user.full_name, "");
    }

    #[test]
    fn user_without_pk_is_rejected() {
        let err = extract_user_short(&json!({"username": "ghost"})).unwrap_err();
        assert!(matches!(err, SearchError::MissingField { field: "pk", .. }));
    }

    #[test]
    fn location_maps_facebook_places_id() {
        let loc = extract_location(&json!({
            "pk": "213385402", "name": "Brooklyn", "lat": 40.65, "lng": -73.95,
            "facebook_places_id": 112111905481230i64
        }))
        .unwrap();
        assert_eq!(loc.pk, Some(213385402));
        assert_eq!(loc.external_id, Some(112111905481230));
        assert_eq!(loc.external_id_source.as_deref(), Some("facebook_places"));
    }

    #[test]
    fn recent_hashtag_renames_formatted_media_count() {
        let tag = extract_recent_hashtag(&json!({
            "id": 17841562498105353i64, "name": "rust", "formatted_media_count": 42
        }))
        .unwrap();
        assert_eq!(tag.media_count, Some(42));
        assert_eq!(tag.id, "17841562498105353");
        let as_json = serde_json::to_value(&tag).unwrap();
        assert!(as_json.get("formatted_media_count").is_none());
    }

    #[test]
    fn recent_hashtag_requires_formatted_media_count() {
        let err = extract_recent_hashtag(&json!({"id": 1, "name": "rust", "media_count": 3}))
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::MissingField { field: "formatted_media_count", .. }
        ));
    }

    #[test]
    fn parse_count_handles_formatted_values() {
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count("12.5K"), Some(12_500));
        assert_eq!(parse_count("3M"), Some(3_000_000));
        assert_eq!(parse_count("1.2M posts"), Some(1_200_000));
        assert_eq!(parse_count("  "), None);
        assert_eq!(parse_count("n/a"), None);
    }

    #[test]
    fn recent_hashtag_count_is_never_dropped_silently() {
        let tag = extract_recent_hashtag(&json!({
            "id": 5, "name": "cats", "formatted_media_count": "1.2M posts"
        }))
        .unwrap();
        assert_eq!(tag.media_count, Some(1_200_000));

        let err = extract_recent_hashtag(&json!({
            "id": 5, "name": "cats", "formatted_media_count": "lots of posts"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            SearchError::MissingField { field: "formatted_media_count", .. }
        ));

        let tag = extract_recent_hashtag(&json!({
            "id": 5, "name": "cats", "formatted_media_count": null
        }))
        .unwrap();
        assert_eq!(tag.media_count, None);
    }

    #[test]
    fn track_uri_comes_from_progressive_download_url() {
        let track = extract_track(&json!({
            "id": "123", "title": "Song", "display_artist": "Band",
            "audio_cluster_id": 987, "progressive_download_url": "https://cdn/x.m4a",
            "duration_in_ms": 1000
        }))
        .unwrap();
        assert_eq!(track.uri.as_deref(), Some("https://cdn/x.m4a"));
        assert_eq!(track.audio_cluster_id.as_deref(), Some("987"));
        assert!(track.highlight_start_times_in_ms.is_empty());
    }

    #[test]
    fn media_picks_largest_candidates_and_carousel_children() {
        let media = extract_media_v1(&json!({
            "pk": 3001, "id": "3001_55", "code": "Cabc", "taken_at": 1700000000,
            "media_type": 8, "product_type": "carousel_container",
            "user": {"pk": 55, "username": "carol"},
            "caption": {"text": "hello"},
            "like_count": 10,
            "image_versions2": {"candidates": [
                {"url": "small", "width": 100, "height": 100},
                {"url": "big", "width": 1080, "height": 1080}
            ]},
            "carousel_media": [
                {"pk": "3002", "media_type": 2,
                 "video_versions": [{"url": "clip", "width": 720, "height": 1280}]}
            ]
        }))
        .unwrap();
        assert_eq!(media.pk, "3001");
        assert_eq!(media.thumbnail_url.as_deref(), Some("big"));
        assert_eq!(media.caption_text, "hello");
        assert_eq!(media.comment_count, 0);
        assert_eq!(media.user.username, "carol");
        assert_eq!(media.resources.len(), 1);
        assert_eq!(media.resources[0].video_url.as_deref(), Some("clip"));
        assert_eq!(media.taken_at.timestamp(), 1700000000);
    }
}
