//! # Pagination
//!
//! Row and count query pairing for list and grid screens.

pub mod page;
pub mod view;

pub use page::{
    fetch_page, total_pages, PageError, PageRequest, PaginatedResult, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use view::{Layout, PageView, GRID_BREAKPOINT_PX};
