//! Client-side page view model
//!
//! The state a list or grid screen renders from, and the layout choice by viewport.

use serde_json::Value;

use crate::gateway::GatewayResult;

use super::page::PaginatedResult;

/// Viewports at least this wide render as a grid
pub const GRID_BREAKPOINT_PX: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    List,
    Grid,
}

impl Layout {
    pub fn for_viewport(width_px: u32) -> Self {
        if width_px >= GRID_BREAKPOINT_PX {
            Layout::Grid
        } else {
            Layout::List
        }
    }
}

/// Render state of one page
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PageView {
    #[default]
    Loading,
    Ready(PaginatedResult),
    Failed(String),
}

impl PageView {
    pub fn from_result(result: GatewayResult<PaginatedResult>) -> Self {
        match result {
            Ok(page) => PageView::Ready(page),
            Err(err) => PageView::Failed(err.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PageView::Loading)
    }

    /// Rows to render; empty unless the page is ready
    pub fn rows(&self) -> &[Value] {
        match self {
            PageView::Ready(page) => &page.rows,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PageView::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Pager label such as `Page 2 of 7`; none while loading or failed
    pub fn pager_label(&self) -> Option<String> {
        match self {
            PageView::Ready(page) if page.total_pages > 0 => {
                Some(format!("Page {} of {}", page.page, page.total_pages))
            }
            _ => None,
        }
    }
}
