//! Bulk board download.
//!
//! The board comes either as one JSON array from `GET {base}/Board` or in
//! offset/limit pages. Pages are fed to the engine in delivery order; the
//! stream ends at the first short page.

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use canvas::engine::{Action, EngineCore};
use frames::PixelRecord;
use tracing::{debug, info};

use crate::CliError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Offset/limit accounting for a paged download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    offset: usize,
    limit: usize,
    done: bool,
}

impl PageCursor {
    pub fn new(limit: usize) -> Self {
        Self {
            offset: 0,
            limit: limit.max(1),
            done: false,
        }
    }

    /// `(offset, limit)` of the next page, or `None` once a short page arrived.
    pub fn next_page(&self) -> Option<(usize, usize)> {
        (!self.done).then_some((self.offset, self.limit))
    }

    /// Account for a page of `received` records.
    pub fn record(&mut self, received: usize) {
        self.offset += received;
        if received < self.limit {
            self.done = true;
        }
    }

    /// Records received so far.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// `{base}/Board`, with paging parameters when given.
pub fn board_url(base_url: &str, page: Option<(usize, usize)>) -> String {
    let base = base_url.trim_end_matches('/');
    match page {
        Some((offset, limit)) => format!("{base}/Board?offset={offset}&limit={limit}"),
        None => format!("{base}/Board"),
    }
}

pub struct Loader<'a> {
    client: &'a reqwest::Client,
    base_url: &'a str,
}

impl<'a> Loader<'a> {
    pub fn new(client: &'a reqwest::Client, base_url: &'a str) -> Self {
        Self { client, base_url }
    }

    /// Load the board into `engine`. A `page_size` of zero fetches one snapshot.
    pub async fn load(&self, engine: &mut EngineCore, page_size: usize) -> Result<Vec<Action>, CliError> {
        info!(base_url = self.base_url, page_size, "loading board");
        if page_size == 0 {
            self.load_snapshot(engine).await
        } else {
            self.load_paged(engine, page_size).await
        }
    }

    async fn load_snapshot(&self, engine: &mut EngineCore) -> Result<Vec<Action>, CliError> {
        let records = self.fetch(&board_url(self.base_url, None)).await?;
        Ok(engine.load_snapshot(&records))
    }

    async fn load_paged(&self, engine: &mut EngineCore, page_size: usize) -> Result<Vec<Action>, CliError> {
        let mut cursor = PageCursor::new(page_size);
        while let Some(page) = cursor.next_page() {
            let records = self.fetch(&board_url(self.base_url, Some(page))).await?;
            let accepted = engine.load_page(&records);
            cursor.record(records.len());
            debug!(offset = cursor.offset(), received = records.len(), accepted, "page loaded");
        }
        Ok(engine.finish_load())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<PixelRecord>, CliError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            debug!(mb = %format!("{:.2}", megabytes(body.len())), "fetching board");
        }
        Ok(frames::decode_board(&body)?)
    }
}

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: usize) -> f64 {
    bytes as f64 / BYTES_PER_MB
}
