//! Query — text search. Case-insensitive
//! substring match over `summary`/`result`, with an optional Postgres
//! full-text path gated by [`PoolConfig::fulltext_enabled`].

use eventlog_core::pagination::{Page, PageRequest};
use eventlog_core::query::{SearchEventsResponse, SearchFilter};
use sqlx::{PgPool, Row};

use crate::error::QueryError;
use crate::row::{map_event_row, EVENT_SELECT_COLUMNS};

/// Strips Postgres FTS meta-characters (`'`, `"`, `\`, `&`, `|`, `!`, `:`,
/// `(`, `)`) before formatting a token as `"tok*"`.
fn escape_fts_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Formats the query's whitespace-separated tokens as `"tok1*" AND "tok2*"`,
/// after escaping FTS meta-characters out of each token.
fn build_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(escape_fts_token)
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\":*"))
        .collect::<Vec<_>>()
        .join(" & ")
}

pub async fn search_events(
    pool: &PgPool,
    filter: &SearchFilter,
    fulltext_enabled: bool,
) -> Result<SearchEventsResponse, QueryError> {
    let page_request = PageRequest::new(filter.page, filter.page_size);

    let rows = if fulltext_enabled {
        let fts_query = build_fts_query(&filter.query);
        let sql = format!(
            "SELECT {EVENT_SELECT_COLUMNS}, COUNT(*) OVER() AS total_count FROM events \
             WHERE is_deleted = FALSE AND search_vector @@ to_tsquery('english', $1) \
             ORDER BY event_timestamp DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query(&sql)
            .bind(fts_query)
            .bind(page_request.limit())
            .bind(page_request.offset())
            .fetch_all(pool)
            .await?
    } else {
        let like_pattern = format!("%{}%", filter.query.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            "SELECT {EVENT_SELECT_COLUMNS}, COUNT(*) OVER() AS total_count FROM events \
             WHERE is_deleted = FALSE \
             AND (summary ILIKE $1 ESCAPE '\\' OR result ILIKE $1 ESCAPE '\\') \
             ORDER BY event_timestamp DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query(&sql)
            .bind(like_pattern)
            .bind(page_request.limit())
            .bind(page_request.offset())
            .fetch_all(pool)
            .await?
    };

    let total_count = rows
        .first()
        .map(|row| row.get::<i64, _>("total_count"))
        .unwrap_or(0);
    let events = rows.iter().map(map_event_row).collect();

    let page = Page::new(events, total_count, page_request);
    Ok(SearchEventsResponse {
        events: page.items,
        total_count: page.total_count,
        page: page.page,
        page_size: page.page_size,
        has_more: page.has_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fts_query_escapes_and_conjoins_tokens() {
        assert_eq!(build_fts_query("invoice created"), "\"invoice\":* & \"created\":*");
    }

    #[test]
    fn fts_query_strips_meta_characters() {
        assert_eq!(build_fts_query("foo'); DROP TABLE--"), "\"foo\":* & \"DROPTABLE\":*");
    }

    #[test]
    fn fts_query_drops_empty_tokens() {
        assert_eq!(build_fts_query("  "), "");
    }
}
