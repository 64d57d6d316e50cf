//! RestTableProvider - IRemoteTable implementation over the REST client
//!
//! Endpoint shapes:
//!
//! - read: `GET /{table}?select=*&order={natural key}[&{column}=eq.{value}]`
//!   with `Range-Unit: items` and `Range: {first}-{last}`, one page at a
//!   time, so a server-side row cap (`max-rows`) cannot truncate a pull
//! - write: `POST /{table}?on_conflict={natural key}` with
//!   `Prefer: resolution=merge-duplicates,return=minimal`, so the service
//!   resolves insert vs update on its own natural-key constraint.

use reqwest::Method;
use tracing::debug;

use bulletin_core::domain::{EntityKind, Record, RemoteError};
use bulletin_core::ports::{IRemoteTable, RowFilter};

use crate::client::RestClient;

/// Header asking the service to merge on conflict and return no body
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// Rows requested per page; matches the hosted default `max-rows`
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Remote table access for every registered entity
#[derive(Clone)]
pub struct RestTableProvider {
    client: RestClient,
    page_size: usize,
}

impl RestTableProvider {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size (at least one row)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }
}

/// Query parameters for a filtered read, ordered by natural key so pages
/// are stable
fn select_params(entity: EntityKind, filter: Option<&RowFilter>) -> Vec<(String, String)> {
    let mut params = vec![
        ("select".to_string(), "*".to_string()),
        ("order".to_string(), entity.spec().natural_key.join(",")),
    ];
    if let Some(filter) = filter {
        params.push((filter.column.clone(), format!("eq.{}", filter.value)));
    }
    params
}

/// Parsed `Content-Range: {first}-{last}/{total}` (or `*/{total}` when empty)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContentRange {
    last: Option<usize>,
    total: Option<usize>,
}

fn parse_content_range(value: &str) -> Option<ContentRange> {
    let (range, total) = value.trim().split_once('/')?;
    let total = match total {
        "*" => None,
        n => Some(n.parse().ok()?),
    };
    let last = match range {
        "*" => None,
        r => Some(r.split_once('-')?.1.parse().ok()?),
    };
    Some(ContentRange { last, total })
}

/// Whether another page must be requested after this one
fn has_more(page_len: usize, page_size: usize, range: Option<ContentRange>) -> bool {
    // A server that ignored the Range header sent everything at once
    let Some(range) = range else {
        return false;
    };
    if page_len < page_size {
        return false;
    }
    match (range.last, range.total) {
        (Some(last), Some(total)) => last + 1 < total,
        (None, _) => false,
        (Some(_), None) => true,
    }
}

#[async_trait::async_trait]
impl IRemoteTable for RestTableProvider {
    async fn fetch(
        &self,
        entity: EntityKind,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<Record>, RemoteError> {
        let table = entity.table();
        let params = select_params(entity, filter);
        let mut rows: Vec<Record> = Vec::new();

        loop {
            let offset = rows.len();
            let request = self
                .client
                .request(Method::GET, &format!("/{table}"))
                .query(&params)
                .header("Range-Unit", "items")
                .header("Range", format!("{}-{}", offset, offset + self.page_size - 1));

            let response = self.client.send(request).await?;
            let range = response
                .headers()
                .get(reqwest::header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_content_range);
            let page = RestClient::json_rows(response).await?;
            let page_len = page.len();

            for row in page {
                rows.push(
                    Record::try_from(row).map_err(|e| RemoteError::InvalidResponse(e.to_string()))?,
                );
            }

            debug!(table, offset, page = page_len, "Fetched remote page");

            if !has_more(page_len, self.page_size, range) {
                break;
            }
        }

        debug!(table, rows = rows.len(), filtered = filter.is_some(), "Fetched remote rows");
        Ok(rows)
    }

    async fn upsert(&self, entity: EntityKind, record: &Record) -> Result<(), RemoteError> {
        let spec = entity.spec();
        let request = self
            .client
            .request(Method::POST, &format!("/{}", spec.table))
            .query(&[("on_conflict", spec.natural_key.join(","))])
            .header("Prefer", UPSERT_PREFER)
            .json(record);

        self.client.send(request).await?;

        debug!(table = spec.table, "Upserted remote row");
        Ok(())
    }
}
