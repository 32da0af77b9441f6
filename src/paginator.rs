use crate::config::Config;
use crate::error::ToolError;
use crate::redmine_client::RedmineApi;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

/// Walk state for one `collect` call.
struct PageState<T> {
    offset: u64,
    total_count: u64,
    pages_fetched: u64,
    records: Vec<T>,
}

/// Follows the tracker's `offset`/`limit`/`total_count` contract until every
/// matching record has been fetched.
///
/// Pages are requested one after the other because the total is only known
/// from the page just received. The walk trusts the live `total_count` of
/// each page, so records created mid-walk can extend it, but never beyond
/// `max_pages` pages.
pub struct Paginator<'a, C: ?Sized> {
    client: &'a C,
    page_size: u64,
    max_pages: u64,
}

impl<'a, C: RedmineApi + ?Sized> Paginator<'a, C> {
    pub fn new(client: &'a C, config: &Config) -> Self {
        Self {
            client,
            page_size: config.page_size,
            max_pages: config.max_pages,
        }
    }

    /// Fetches every page of `path`, reading the records under
    /// `collection_key` and passing each through `normalize`. Records for
    /// which `normalize` returns `None` are dropped. Any failure discards
    /// everything fetched so far.
    pub async fn collect<R, T, F>(
        &self,
        path: &str,
        base_query: &[(String, String)],
        collection_key: &str,
        mut normalize: F,
    ) -> Result<Vec<T>, ToolError>
    where
        R: DeserializeOwned,
        F: FnMut(R) -> Option<T>,
    {
        let mut state = PageState {
            offset: 0,
            total_count: 0,
            pages_fetched: 0,
            records: Vec::new(),
        };

        loop {
            let mut query = base_query.to_vec();
            query.push(("offset".to_string(), state.offset.to_string()));
            query.push(("limit".to_string(), self.page_size.to_string()));

            let mut body = self.client.get_json(path, &query).await?;
            let page: Vec<R> = match body.get_mut(collection_key).map(Value::take) {
                Some(Value::Null) | None => Vec::new(),
                Some(items) => serde_json::from_value(items)?,
            };
            let page_len = page.len();

            state.total_count = body
                .get("total_count")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            state.pages_fetched += 1;
            state.records.extend(page.into_iter().filter_map(&mut normalize));

            debug!(
                path,
                offset = state.offset,
                page_len,
                total_count = state.total_count,
                "Fetched page"
            );

            state.offset += self.page_size;
            if state.offset >= state.total_count {
                break;
            }
            if state.pages_fetched >= self.max_pages {
                return Err(ToolError::PageLimitExceeded {
                    max_pages: self.max_pages,
                    total_count: state.total_count,
                });
            }
        }

        info!(
            path,
            pages = state.pages_fetched,
            records = state.records.len(),
            "Collected all pages"
        );
        Ok(state.records)
    }
}
