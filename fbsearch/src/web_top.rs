//! Web top-search: page decoding and the paginated media scan.

use crate::error::{Result, SearchError};
use crate::extract::{extract_media_v1, id_to_string};
use crate::search::SearchClient;
use crate::transport::{Params, Transport};
use crate::types::Media;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const WEB_TOP_PATH: &str = "fbsearch/web/top_serp/";
pub const DEFAULT_WEB_TOP_LIMIT: usize = 100;

/// A `media_grid.sections` entry, classified by its `layout_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum GridSection<'a> {
    /// `media_grid`: containers under `layout_content.medias`.
    MediaGrid(&'a [Value]),
    /// `one_by_two_left` / `one_by_two_right`: containers under `layout_content.fill_items`.
    OneByTwo(&'a [Value]),
    Unknown(String),
}

impl<'a> GridSection<'a> {
    fn containers(&self) -> &'a [Value] {
        match self {
            GridSection::MediaGrid(c) | GridSection::OneByTwo(c) => *c,
            GridSection::Unknown(_) => &[],
        }
    }
}

fn section_items<'a>(section: &'a Value, key: &'static str) -> Result<&'a [Value]> {
    section
        .get("layout_content")
        .and_then(|c| c.get(key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| SearchError::missing("web top section", key))
}

fn media_grid(page: &Value) -> Result<&Value> {
    page.get("media_grid")
        .ok_or_else(|| SearchError::missing("web top page", "media_grid"))
}

pub fn decode_sections<'a>(page: &'a Value) -> Result<Vec<GridSection<'a>>> {
    let sections = media_grid(page)?
        .get("sections")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::missing("web top page", "sections"))?;

    sections
        .iter()
        .map(|section| -> Result<GridSection<'a>> {
            let layout = section
                .get("layout_type")
                .and_then(Value::as_str)
                .ok_or_else(|| SearchError::missing("web top section", "layout_type"))?;
            Ok(match layout {
                "media_grid" => GridSection::MediaGrid(section_items(section, "medias")?),
                "one_by_two_left" | "one_by_two_right" => {
                    GridSection::OneByTwo(section_items(section, "fill_items")?)
                }
                other => GridSection::Unknown(other.to_string()),
            })
        })
        .collect()
}

/// Media of a single web top-search page, in section then item order.
/// Sections with an unrecognized layout contribute nothing.
pub fn extract_media_for_web_top_search(page: &Value) -> Result<Vec<Media>> {
    let mut medias = Vec::new();
    for section in decode_sections(page)? {
        if let GridSection::Unknown(layout) = &section {
            warn!("Unknown layout_type {}", layout);
            continue;
        }
        for container in section.containers() {
            let media = container
                .get("media")
                .ok_or_else(|| SearchError::missing("web top item", "media"))?;
            medias.push(extract_media_v1(media)?);
        }
    }
    Ok(medias)
}

/// `rank_token` and `next_max_id` of the page just fetched.
fn next_page_cursor(page: &Value, collected: usize) -> Result<(Option<String>, String)> {
    let grid = media_grid(page)?;
    let rank_token = match grid.get("rank_token") {
        Some(Value::Null) => None,
        Some(token) => Some(
            id_to_string(token)
                .ok_or_else(|| SearchError::missing("web top page", "rank_token"))?,
        ),
        None => return Err(SearchError::missing("web top page", "rank_token")),
    };
    let next_max_id = grid
        .get("next_max_id")
        .ok_or_else(|| SearchError::missing("web top page", "next_max_id"))?;
    match id_to_string(next_max_id) {
        Some(cursor) => Ok((rank_token, cursor)),
        None if next_max_id.is_null() || next_max_id.as_str() == Some("") => {
            Err(SearchError::PaginationExhausted { collected })
        }
        None => Err(SearchError::missing("web top page", "next_max_id")),
    }
}

impl<T: Transport> SearchClient<T> {
    /// Collect web top-search media until more than `limit` are gathered.
    ///
    /// If the first page already holds `limit` or more it is returned as is. Later
    /// pages are fetched while the buffer holds `<= limit` media, so a buffer that
    /// lands exactly on `limit` still pulls one more page. Results are never
    /// truncated. Only the first request carries the client session id.
    pub async fn fbsearch_web_top_serp(&self, query: &str, limit: usize) -> Result<Vec<Media>> {
        info!("Web top search for: {} (limit {})", query, limit);
        let domain = Some(self.web_domain.as_str());
        let mut params = Params::new();
        params.insert("query".into(), query.to_string());
        params.insert("enable_metadata".into(), "true".into());
        params.insert(
            "search_session_id".into(),
            self.session.client_session_id.clone(),
        );

        let mut result = self
            .transport
            .private_request(WEB_TOP_PATH, &params, domain)
            .await?;
        let mut medias = extract_media_for_web_top_search(&result)?;
        debug!("extract media {}", medias.len());
        if medias.len() >= limit {
            return Ok(medias);
        }

        params.insert("search_session_id".into(), String::new());

        while medias.len() <= limit {
            let (rank_token, next_max_id) = next_page_cursor(&result, medias.len())?;
            match rank_token {
                Some(token) => params.insert("rank_token".into(), token),
                None => params.remove("rank_token"),
            };
            params.insert("next_max_id".into(), next_max_id);

            result = self
                .transport
                .private_request(WEB_TOP_PATH, &params, domain)
                .await?;
            medias.extend(extract_media_for_web_top_search(&result)?);
            debug!("extract media {}", medias.len());
        }
        Ok(medias)
    }
}
