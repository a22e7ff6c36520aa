use std::{num::NonZeroU32, sync::Arc};

use crate::{
    AccessorOptions, PageRequest, PageResult, PageSize, TransportError, UnboundedPageCount,
    events::{FetchEvent, FetchEventVariant},
    total_pages,
};

const MAX_RECENT_EVENTS: usize = 16;

/// Where a list view is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListStatus {
    /// Nothing requested yet.
    Idle,
    /// A fetch is in flight. Any previously loaded items are still available.
    Loading,
    /// The latest fetch succeeded.
    Ready,
    /// The latest fetch failed. Any previously loaded items are still available, but stale.
    Failed,
}

/// Everything that can move a [`ListViewState`] forward.
#[derive(Debug)]
pub enum ListEvent<Record> {
    /// The list was first shown, or shown again.
    Mounted,
    /// The user asked for another page.
    PageChanged(u32),
    /// The user picked another page size. Always jumps back to page 1.
    PageSizeChanged(PageSize),
    /// A record was created, updated or deleted elsewhere, the current page should be fetched again.
    MutationCompleted,
    /// Fetch the current page again after a failure.
    Retry,
    /// A fetch finished.
    FetchSucceeded {
        /// The generation from the [`FetchTicket`] that was fetched.
        generation: u64,
        /// The fetched page.
        result: PageResult<Record>,
    },
    /// A fetch failed.
    FetchFailed {
        /// The generation from the [`FetchTicket`] that was fetched.
        generation: u64,
        /// Why.
        error: TransportError,
    },
}

/// A fetch the caller must perform, then report back with the same generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// Strictly increasing per list view. Only the latest generation's result is ever applied.
    pub generation: u64,
    /// The page to fetch.
    pub request: PageRequest,
}

/// The result of [`ListViewState::reduce`].
#[derive(Debug)]
pub struct Transition<Record> {
    /// The next state.
    pub state: ListViewState<Record>,
    /// A fetch to start, if the event called for one.
    pub fetch: Option<FetchTicket>,
}

/// The state of a paginated list view, advanced only by [`ListViewState::reduce`].
#[derive(Debug)]
pub struct ListViewState<Record> {
    request: PageRequest,
    status: ListStatus,
    items: Arc<[Record]>,
    total_count: u64,
    total_pages: Option<u64>,
    error: Option<&'static str>,
    latest_generation: u64,
    recent_events: Vec<FetchEvent>,
    unbounded_page_size: NonZeroU32,
    unbounded_page_count: UnboundedPageCount,
}

impl<Record> Clone for ListViewState<Record> {
    fn clone(&self) -> Self {
        Self {
            request: self.request,
            status: self.status,
            items: self.items.clone(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            error: self.error,
            latest_generation: self.latest_generation,
            recent_events: self.recent_events.clone(),
            unbounded_page_size: self.unbounded_page_size,
            unbounded_page_count: self.unbounded_page_count,
        }
    }
}

impl<Record> ListViewState<Record> {
    /// An idle view that will show page 1 at `page_size` once mounted.
    pub fn new(page_size: PageSize) -> Self {
        Self::new_with_options(&AccessorOptions::new().set_default_page_size(page_size))
    }

    /// An idle view starting from [`AccessorOptions::default_page_size`].
    ///
    /// Use the same options as the accessor, so page counts derived here agree with fetched ones.
    pub fn new_with_options(options: &AccessorOptions) -> Self {
        Self {
            request: PageRequest::first(options.default_page_size()),
            status: ListStatus::Idle,
            items: Arc::from(Vec::new()),
            total_count: 0,
            total_pages: None,
            error: None,
            latest_generation: 0,
            recent_events: vec![],
            unbounded_page_size: options.unbounded_page_size(),
            unbounded_page_count: options.unbounded_page_count(),
        }
    }

    /// The page currently shown, or being loaded.
    pub fn request(&self) -> PageRequest {
        self.request
    }

    /// The current 1-based page number.
    pub fn page_number(&self) -> u32 {
        self.request.page_number().get()
    }

    /// The current page size.
    pub fn page_size(&self) -> PageSize {
        self.request.page_size()
    }

    /// Where the view is in its fetch cycle.
    pub fn status(&self) -> ListStatus {
        self.status
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    /// The last successfully loaded records.
    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// The size of the whole collection as of the last successful load.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// The page count as of the last successful load, `0` before anything loaded or for an empty collection.
    pub fn total_pages(&self) -> u64 {
        self.total_pages.unwrap_or(0)
    }

    /// The user-facing error message, only set while [`ListStatus::Failed`].
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// The generation of the most recently issued [`FetchTicket`].
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// The most recent fetch events, oldest first.
    pub fn recent_events(&self) -> &[FetchEvent] {
        &self.recent_events
    }

    /// Whether a previous page exists.
    pub fn has_prev_page(&self) -> bool {
        self.page_number() > 1
    }

    /// Whether a next page exists.
    pub fn has_next_page(&self) -> bool {
        u64::from(self.page_number()) < self.total_pages()
    }

    /// e.g. "Page 2 of 3 (23 items)".
    pub fn page_label(&self) -> String {
        format!(
            "Page {} of {} ({} items)",
            self.page_number(),
            self.total_pages(),
            self.total_count
        )
    }

    /// Compute the state that follows `event`, and the fetch to start, if any.
    pub fn reduce(&self, event: ListEvent<Record>) -> Transition<Record> {
        match event {
            ListEvent::Mounted | ListEvent::Retry => self.start_fetch(self.request, None),
            ListEvent::MutationCompleted => {
                self.start_fetch(self.request, Some(FetchEventVariant::Invalidated))
            }
            ListEvent::PageChanged(page_number) => match self.accept_page(page_number) {
                Some(page_number) => {
                    self.start_fetch(self.request.with_page_number(page_number), None)
                }
                None => self.unchanged(),
            },
            ListEvent::PageSizeChanged(page_size) => {
                let request = PageRequest::first(page_size);
                if request == self.request && self.status != ListStatus::Idle {
                    self.unchanged()
                } else {
                    let mut transition = self.start_fetch(request, None);
                    // Page bounds follow the new size while its first page loads:
                    transition.state.total_pages = self.total_pages.map(|_| {
                        total_pages(
                            self.total_count,
                            page_size,
                            self.unbounded_page_size,
                            self.unbounded_page_count,
                        )
                    });
                    transition
                }
            }
            ListEvent::FetchSucceeded { generation, result } => {
                if generation != self.latest_generation {
                    return self.discard_stale(generation);
                }
                let mut state = self.clone();
                state.status = ListStatus::Ready;
                state.error = None;
                state.items = result.shared_items();
                state.total_count = result.total_count();
                state.total_pages = Some(result.total_pages());
                state.push_event(FetchEventVariant::Fetched {
                    elapsed_ms: result.elapsed_ms(),
                    generation,
                });
                Transition { state, fetch: None }
            }
            ListEvent::FetchFailed { generation, error } => {
                if generation != self.latest_generation {
                    return self.discard_stale(generation);
                }
                let mut state = self.clone();
                state.status = ListStatus::Failed;
                state.error = Some(error.user_message());
                state.push_event(FetchEventVariant::Failed { generation });
                Transition { state, fetch: None }
            }
        }
    }

    /// Page numbers outside `1..=total_pages` are ignored once the page count is known.
    /// An empty collection still has a page 1 to show.
    fn accept_page(&self, page_number: u32) -> Option<NonZeroU32> {
        let page_number = NonZeroU32::new(page_number)?;
        if page_number == self.request.page_number() && self.status != ListStatus::Idle {
            return None;
        }
        match self.total_pages {
            Some(total_pages) if u64::from(page_number.get()) > total_pages.max(1) => None,
            _ => Some(page_number),
        }
    }

    fn start_fetch(
        &self,
        request: PageRequest,
        event: Option<FetchEventVariant>,
    ) -> Transition<Record> {
        let mut state = self.clone();
        state.latest_generation += 1;
        state.request = request;
        state.status = ListStatus::Loading;
        state.error = None;
        if let Some(event) = event {
            state.push_event(event);
        }
        let fetch = Some(FetchTicket {
            generation: state.latest_generation,
            request,
        });
        Transition { state, fetch }
    }

    fn discard_stale(&self, generation: u64) -> Transition<Record> {
        tracing::debug!(
            generation,
            latest_generation = self.latest_generation,
            "discarding stale list response"
        );
        let mut state = self.clone();
        state.push_event(FetchEventVariant::StaleDiscarded { generation });
        Transition { state, fetch: None }
    }

    fn unchanged(&self) -> Transition<Record> {
        Transition {
            state: self.clone(),
            fetch: None,
        }
    }

    fn push_event(&mut self, variant: FetchEventVariant) {
        if self.recent_events.len() == MAX_RECENT_EVENTS {
            self.recent_events.remove(0);
        }
        self.recent_events.push(FetchEvent::new(variant));
    }
}
