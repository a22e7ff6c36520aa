use std::{fmt, num::NonZeroU32, sync::Arc};

use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;

use crate::UnboundedPageCount;

/// The number of records per page.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum PageSize {
    /// A concrete number of records per page.
    Fixed(NonZeroU32),
    /// Show everything on one page.
    ///
    /// Translated to [`crate::AccessorOptions::unbounded_page_size`] before it reaches the backend.
    All,
}

impl PageSize {
    /// A fixed page size, or `None` if `size` is zero.
    pub fn fixed(size: u32) -> Option<Self> {
        NonZeroU32::new(size).map(Self::Fixed)
    }

    /// Whether this is the [`PageSize::All`] sentinel.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The size actually sent to the backend.
    pub fn effective(&self, unbounded: NonZeroU32) -> NonZeroU32 {
        match self {
            Self::Fixed(size) => *size,
            Self::All => unbounded,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Fixed(size) => write!(f, "{size}"),
            PageSize::All => write!(f, "All"),
        }
    }
}

/// Which page of the collection to fetch. Page numbers start from 1.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct PageRequest {
    page_number: NonZeroU32,
    page_size: PageSize,
}

impl PageRequest {
    /// Build a request, or `None` if `page_number` is zero.
    pub fn new(page_number: u32, page_size: PageSize) -> Option<Self> {
        NonZeroU32::new(page_number).map(|page_number| Self {
            page_number,
            page_size,
        })
    }

    /// The first page at the given size.
    pub fn first(page_size: PageSize) -> Self {
        Self {
            page_number: NonZeroU32::MIN,
            page_size,
        }
    }

    /// The 1-based page number.
    pub fn page_number(&self) -> NonZeroU32 {
        self.page_number
    }

    /// The requested page size, possibly the [`PageSize::All`] sentinel.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// The same page size at a different page number.
    pub(crate) fn with_page_number(self, page_number: NonZeroU32) -> Self {
        Self {
            page_number,
            ..self
        }
    }
}

/// One page of records exactly as the backend described it, after normalising its wire shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage<Record> {
    /// The records on this page, in backend order.
    pub items: Vec<Record>,
    /// The size of the whole collection, not just this page.
    pub total_count: u64,
}

/// Number of pages needed to show `total_count` records.
///
/// An empty collection has `0` pages. Under [`UnboundedPageCount::AlwaysOne`] the [`PageSize::All`] sentinel
/// always reports `1`.
pub fn total_pages(
    total_count: u64,
    page_size: PageSize,
    unbounded: NonZeroU32,
    policy: UnboundedPageCount,
) -> u64 {
    match (page_size, policy) {
        (PageSize::All, UnboundedPageCount::AlwaysOne) => 1,
        _ => total_count.div_ceil(u64::from(page_size.effective(unbounded).get())),
    }
}

/// A fetched page plus everything derived from it.
#[derive(Debug, Clone)]
pub struct PageResult<Record> {
    pub(crate) request: PageRequest,
    pub(crate) items: Arc<[Record]>,
    pub(crate) total_count: u64,
    pub(crate) total_pages: u64,
    pub(crate) fetched_at: DateTime<Utc>,
    pub(crate) elapsed_ms: i64,
}

impl<Record> PageResult<Record> {
    /// The request that produced this page.
    pub fn request(&self) -> PageRequest {
        self.request
    }

    /// The records on this page.
    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// A cheap shared handle to the records on this page.
    pub fn shared_items(&self) -> Arc<[Record]> {
        self.items.clone()
    }

    /// The size of the whole collection.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// The number of pages in the whole collection at the requested size.
    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// When the response was received.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// How long the round trip took.
    pub fn elapsed_ms(&self) -> i64 {
        self.elapsed_ms
    }

    /// e.g. "a few seconds ago".
    pub fn fetched_ago(&self) -> String {
        HumanTime::from(self.fetched_at).to_string()
    }
}
