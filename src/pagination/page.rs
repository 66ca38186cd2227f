//! Page requests and paginated results
//!
//! A page is always the pair of a row query (limit/offset) and a count query over the
//! same filters. Both are issued together and the page is only assembled when both
//! succeed.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::gateway::{CountPrecision, GatewayResult, SessionGateway, TableQuery};

/// Default rows per page
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page must be a positive integer")]
    ZeroPage,

    #[error("page_size must be a positive integer")]
    ZeroPageSize,

    #[error("page_size must not exceed {max}")]
    PageSizeTooLarge { max: usize },

    #[error("page is out of range")]
    PageOutOfRange,
}

/// A 1-based page of `page_size` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Result<Self, PageError> {
        if page == 0 {
            return Err(PageError::ZeroPage);
        }
        if page_size == 0 {
            return Err(PageError::ZeroPageSize);
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(PageError::PageSizeTooLarge { max: MAX_PAGE_SIZE });
        }
        if (page - 1).checked_mul(page_size).is_none() {
            return Err(PageError::PageOutOfRange);
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    /// The following page, keeping the size; none once the offset would overflow
    pub fn next(&self) -> Option<Self> {
        let page = self.page.checked_add(1)?;
        Self::new(page, self.page_size).ok()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Number of pages needed for `count` rows; zero rows means zero pages
pub fn total_pages(count: u64, page_size: usize) -> u64 {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size as u64)
}

/// One page of rows with its count metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult {
    #[serde(rename = "data")]
    pub rows: Vec<Value>,
    pub total_count: u64,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: u64,
    pub count_precision: CountPrecision,
}

impl PaginatedResult {
    pub fn assemble(
        rows: Vec<Value>,
        total_count: u64,
        request: PageRequest,
        count_precision: CountPrecision,
    ) -> Self {
        Self {
            rows,
            total_count,
            page: request.page(),
            page_size: request.page_size(),
            total_pages: total_pages(total_count, request.page_size()),
            count_precision,
        }
    }

    pub fn has_next_page(&self) -> bool {
        (self.page as u64) < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

/// Fetch one page: rows and count concurrently, failing if either fails
pub async fn fetch_page(
    gateway: &SessionGateway,
    query: &TableQuery,
    request: PageRequest,
    precision: CountPrecision,
) -> GatewayResult<PaginatedResult> {
    let rows_query = query.clone().range(request.page_size(), request.offset());
    let count_query = query.without_pagination();

    let (rows, count) = tokio::join!(
        gateway.select(&rows_query),
        gateway.count(&count_query, precision)
    );

    Ok(PaginatedResult::assemble(rows?, count?, request, precision))
}
