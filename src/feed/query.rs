use serde::Deserialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::{
    error::{AppError, AppResult},
    validation::Validator,
};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 20;
pub const MAX_TAGS: usize = 5;
pub const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Raw feed query string, e.g. `?limit=10&tags=rust,go&since=2024-01-01 00:00:00`.
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub tags: Option<String>,
    pub search: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

/// Validated feed query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub limit: i64,
    pub offset: i64,
    pub sort: SortOrder,
    /// A post must carry every listed tag.
    pub tags: Vec<String>,
    /// Case-insensitive substring of title or content.
    pub search: Option<String>,
    pub since: Option<OffsetDateTime>,
    pub until: Option<OffsetDateTime>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: SortOrder::Desc,
            tags: Vec::new(),
            search: None,
            since: None,
            until: None,
        }
    }
}

impl FeedParams {
    pub fn validate(self, v: &Validator) -> AppResult<FeedQuery> {
        let mut q = FeedQuery::default();

        if let Some(raw) = non_empty(self.limit.as_deref()) {
            q.limit = parse_int("limit", raw)?;
        }
        v.range("limit", q.limit, 1, MAX_LIMIT)?;

        if let Some(raw) = non_empty(self.offset.as_deref()) {
            q.offset = parse_int("offset", raw)?;
        }
        v.range("offset", q.offset, 0, i64::MAX)?;

        if let Some(raw) = non_empty(self.sort.as_deref()) {
            q.sort = match raw.to_ascii_lowercase().as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                _ => return Err(AppError::validation("sort must be one of: asc desc")),
            };
        }

        if let Some(raw) = non_empty(self.tags.as_deref()) {
            q.tags = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect();
        }
        v.max_items("tags", &q.tags, MAX_TAGS)?;

        if let Some(raw) = non_empty(self.search.as_deref()) {
            v.length("search", raw, 1, MAX_SEARCH_LEN)?;
            q.search = Some(raw.to_owned());
        }

        // unparsable dates are dropped, not rejected
        q.since = non_empty(self.since.as_deref()).and_then(parse_time);
        q.until = non_empty(self.until.as_deref()).and_then(parse_time);

        Ok(q)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_int(field: &str, raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::validation(format!("{field} must be an integer")))
}

/// RFC 3339, or `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_time(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(t);
    }
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, fmt)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}
