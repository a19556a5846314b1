//! Tool catalogue and dispatch shared by the HTTP and stdio MCP surfaces.

use crate::error::SearchError;
use crate::search::SearchClient;
use crate::transport::Transport;
use crate::types::*;
use crate::web_top::DEFAULT_WEB_TOP_LIMIT;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::info;

pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Largest `limit` the service surfaces accept for a web top search.
pub const MAX_WEB_TOP_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Search(#[from] SearchError),
}

fn query_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {"type": "string", "description": description}
        },
        "required": ["query"]
    })
}

pub fn catalogue() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "search_users",
            description: "Search accounts by name or username. Returns up to 30 short profiles.",
            input_schema: query_schema("Name or username to look up"),
        },
        ToolSpec {
            name: "search_hashtags",
            description: "Search hashtags. Returns tag names with their media counts.",
            input_schema: query_schema("Hashtag text without the leading #"),
        },
        ToolSpec {
            name: "search_places",
            description: "Search places near a coordinate (defaults to New York).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Place name"},
                    "lat": {"type": "number", "description": "Latitude"},
                    "lng": {"type": "number", "description": "Longitude"}
                },
                "required": ["query"]
            }),
        },
        ToolSpec {
            name: "search_music",
            description: "Search the music catalogue for tracks.",
            input_schema: query_schema("Song title or artist"),
        },
        ToolSpec {
            name: "top_search",
            description: "Blended top search over users, hashtags and places.",
            input_schema: query_schema("Free text query"),
        },
        ToolSpec {
            name: "suggested_profiles",
            description: "Profiles suggested alongside a given account.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "string", "description": "Numeric id of the target account"}
                },
                "required": ["user_id"]
            }),
        },
        ToolSpec {
            name: "recent_searches",
            description: "Recently searched users, hashtags and keywords of the logged-in session.",
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolSpec {
            name: "web_top_search",
            description: "Paginated web top search. Collects posts until more than `limit` are gathered.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Free text query"},
                    "limit": {"type": "integer", "description": "Minimum number of posts (default 100, at most 1000)"}
                },
                "required": ["query"]
            }),
        },
    ]
}

fn str_arg<'a>(args: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingParam(key))
}

/// Resolve a caller-supplied web top-search limit, rejecting values above
/// [`MAX_WEB_TOP_LIMIT`].
pub fn web_top_limit(requested: Option<usize>) -> Result<usize, ToolError> {
    match requested {
        None => Ok(DEFAULT_WEB_TOP_LIMIT),
        Some(n) if n > MAX_WEB_TOP_LIMIT => Err(ToolError::InvalidParam(format!(
            "limit {} exceeds the maximum of {}",
            n, MAX_WEB_TOP_LIMIT
        ))),
        Some(n) => Ok(n),
    }
}

fn numbered<T>(header: String, items: &[T], line: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return format!("{} (none)", header);
    }
    let mut text = format!("{}:\n\n", header);
    for (i, item) in items.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, line(item)));
    }
    text
}

fn user_line(u: &UserShort) -> String {
    if u.full_name.is_empty() {
        format!("**@{}** (pk {})", u.username, u.pk)
    } else {
        format!("**@{}** {} (pk {})", u.username, u.full_name, u.pk)
    }
}

fn hashtag_line(h: &Hashtag) -> String {
    match h.media_count {
        Some(n) => format!("#{} ({} posts)", h.name, n),
        None => format!("#{}", h.name),
    }
}

fn location_line(l: &Location) -> String {
    match (l.lat, l.lng) {
        (Some(lat), Some(lng)) => format!("{} ({:.4}, {:.4})", l.name, lat, lng),
        _ => l.name.clone(),
    }
}

fn media_line(m: &Media) -> String {
    let caption: String = m.caption_text.chars().take(120).collect();
    format!(
        "https://www.instagram.com/p/{}/ by @{} ({} likes) {}",
        m.code, m.user.username, m.like_count, caption
    )
}

fn keyword_text(k: &Value) -> String {
    match k {
        Value::String(s) => s.clone(),
        other => other
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

/// Run a tool by name and render its result as text.
pub async fn call_tool<T: Transport>(
    client: &SearchClient<T>,
    name: &str,
    args: &Map<String, Value>,
) -> Result<String, ToolError> {
    info!("tool call: {} with args: {:?}", name, args);
    match name {
        "search_users" => {
            let query = str_arg(args, "query")?;
            let users = client.search_users(query).await?;
            Ok(numbered(
                format!("Found {} users for '{}'", users.len(), query),
                &users,
                user_line,
            ))
        }
        "search_hashtags" => {
            let query = str_arg(args, "query")?;
            let tags = client.search_hashtags(query).await?;
            Ok(numbered(
                format!("Found {} hashtags for '{}'", tags.len(), query),
                &tags,
                hashtag_line,
            ))
        }
        "search_places" => {
            let query = str_arg(args, "query")?;
            let lat = args.get("lat").and_then(Value::as_f64);
            let lng = args.get("lng").and_then(Value::as_f64);
            let places = client.fbsearch_places(query, lat, lng).await?;
            Ok(numbered(
                format!("Found {} places for '{}'", places.len(), query),
                &places,
                location_line,
            ))
        }
        "search_music" => {
            let query = str_arg(args, "query")?;
            let tracks = client.search_music(query).await?;
            Ok(numbered(
                format!("Found {} tracks for '{}'", tracks.len(), query),
                &tracks,
                |t| format!("{} by {}", t.title, t.display_artist),
            ))
        }
        "top_search" => {
            let query = str_arg(args, "query")?;
            let items = client.fbsearch_topsearch_flat(query).await?;
            Ok(numbered(
                format!("Found {} top results for '{}'", items.len(), query),
                &items,
                |item| match item {
                    TopSearchItem::User(u) => format!("user {}", user_line(u)),
                    TopSearchItem::Hashtag(h) => format!("hashtag {}", hashtag_line(h)),
                    TopSearchItem::Place(l) => format!("place {}", location_line(l)),
                    TopSearchItem::Unknown(_) => "unrecognized result".to_string(),
                },
            ))
        }
        "suggested_profiles" => {
            let user_id = str_arg(args, "user_id")?;
            let users = client.fbsearch_suggested_profiles(user_id).await?;
            Ok(numbered(
                format!("Found {} suggested profiles for user {}", users.len(), user_id),
                &users,
                user_line,
            ))
        }
        "recent_searches" => {
            let recent = client.fbsearch_recent().await?;
            Ok(numbered(
                format!("{} recent searches", recent.len()),
                &recent,
                |r| {
                    let when = r
                        .client_time_utc()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown time".to_string());
                    let what = match &r.entry {
                        RecentEntry::User(u) => format!("user {}", user_line(u)),
                        RecentEntry::Hashtag(h) => format!("hashtag {}", hashtag_line(h)),
                        RecentEntry::Keyword(k) => format!("keyword \"{}\"", keyword_text(k)),
                        RecentEntry::Unknown(_) => "unrecognized entry".to_string(),
                    };
                    format!("[{}] {}", when, what)
                },
            ))
        }
        "web_top_search" => {
            let query = str_arg(args, "query")?;
            let limit = web_top_limit(
                args.get("limit")
                    .and_then(Value::as_u64)
                    .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
            )?;
            let medias = client.fbsearch_web_top_serp(query, limit).await?;
            Ok(numbered(
                format!("Found {} posts for '{}'", medias.len(), query),
                &medias,
                media_line,
            ))
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionContext;
    use crate::testing::ScriptedTransport;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn catalogue_names_are_unique() {
        let names: std::collections::HashSet<_> = catalogue().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), catalogue().len());
    }

    #[tokio::test]
    async fn hashtag_tool_renders_counts() {
        let client = SearchClient::new(
            ScriptedTransport::new(vec![json!({"results": [
                {"id": 1, "name": "rust", "media_count": 12}
            ]})]),
            SessionContext::new(0, "s"),
        );
        let text = call_tool(&client, "search_hashtags", &args(json!({"query": "rust"})))
            .await
            .unwrap();
        assert!(text.starts_with("Found 1 hashtags for 'rust'"));
        assert!(text.contains("1. #rust (12 posts)"));
    }

    #[tokio::test]
    async fn missing_argument_is_reported_before_any_request() {
        let client = SearchClient::new(ScriptedTransport::new(vec![]), SessionContext::new(0, "s"));
        let err = call_tool(&client, "search_users", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingParam("query")));
        assert!(client.transport().calls().is_empty());
    }

    #[test]
    fn web_top_limit_defaults_and_caps() {
        assert_eq!(web_top_limit(None).unwrap(), DEFAULT_WEB_TOP_LIMIT);
        assert_eq!(web_top_limit(Some(MAX_WEB_TOP_LIMIT)).unwrap(), MAX_WEB_TOP_LIMIT);
        assert!(matches!(
            web_top_limit(Some(MAX_WEB_TOP_LIMIT + 1)),
            Err(ToolError::InvalidParam(_))
        ));
    }

    #[tokio::test]
    async fn oversized_web_top_limit_is_refused_before_any_request() {
        let client = SearchClient::new(ScriptedTransport::new(vec![]), SessionContext::new(0, "s"));
        let err = call_tool(
            &client,
            "web_top_search",
            &args(json!({"query": "cats", "limit": 1_000_000_000u64})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParam(_)));
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn recent_keyword_objects_render_by_name() {
        let client = SearchClient::new(
            ScriptedTransport::new(vec![json!({"status": "ok", "recent": [
                {"keyword": "tacos"},
                {"keyword": {"id": 7, "name": "cats"}}
            ]})]),
            SessionContext::new(0, "s"),
        );
        let text = call_tool(&client, "recent_searches", &Map::new()).await.unwrap();
        assert!(text.contains("1. [unknown time] keyword \"tacos\""));
        assert!(text.contains("2. [unknown time] keyword \"cats\""));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let client = SearchClient::new(ScriptedTransport::new(vec![]), SessionContext::new(0, "s"));
        let err = call_tool(&client, "delete_account", &Map::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: delete_account");
    }
}
