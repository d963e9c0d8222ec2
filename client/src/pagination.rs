//! Offset-based pagination over `first`/`skip` list queries.

/// Rows requested per page. The registry caps `first` at this value.
pub const PAGE_SIZE: u32 = 1000;

/// Position within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    offset: u64,
    page_size: u32,
}

impl PageCursor {
    /// Cursor for the first page. A zero page size is bumped to 1.
    pub fn first(page_size: u32) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Cursor for the following page, or `None` when `returned` rows is a
    /// short page (including an empty one), meaning the listing is exhausted.
    pub fn next(self, returned: usize) -> Option<Self> {
        if (returned as u64) < self.page_size as u64 {
            None
        } else {
            Some(Self {
                offset: self.offset + self.page_size as u64,
                page_size: self.page_size,
            })
        }
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::first(PAGE_SIZE)
    }
}
