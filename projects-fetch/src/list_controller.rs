use leptos::prelude::{ArcRwSignal, Update, WithUntracked, expect_context, provide_context};

use crate::{
    FetchTicket, ListEvent, ListViewState, PageSize, PaginatedAccessor, RecordMutations,
    RecordTransport, TransportError,
};

/// Drives a [`ListViewState`] from user events, fetching through a [`PaginatedAccessor`].
///
/// The state lives in an [`ArcRwSignal`], so views reading it rerender whenever a fetch starts or lands.
/// Responses to superseded requests are dropped, so the page shown is always the one last asked for.
///
/// # Example
///
/// ```rust,ignore
/// use leptos::prelude::*;
/// use projects_fetch::{HttpTransport, ListController, PaginatedAccessor, TransportOptions};
///
/// #[component]
/// pub fn ProjectsPage() -> impl IntoView {
///     let transport = HttpTransport::new(&TransportOptions::from_env());
///     let controller = ListController::new(PaginatedAccessor::new(transport));
///     controller.mount();
///     let state = controller.state();
///     view! { <p>{move || state.read().page_label()}</p> }
/// }
/// ```
pub struct ListController<T: RecordTransport> {
    accessor: PaginatedAccessor<T>,
    state: ArcRwSignal<ListViewState<T::Record>>,
}

impl<T: RecordTransport> Clone for ListController<T> {
    fn clone(&self) -> Self {
        Self {
            accessor: self.accessor.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> ListController<T>
where
    T: RecordTransport + 'static,
{
    /// Create an idle controller, starting at page 1 of [`crate::AccessorOptions::default_page_size`].
    ///
    /// Nothing is fetched until [`Self::mount`].
    pub fn new(accessor: PaginatedAccessor<T>) -> Self {
        let state = ListViewState::new_with_options(accessor.options());
        Self {
            accessor,
            state: ArcRwSignal::new(state),
        }
    }

    /// Provide this controller via leptos context.
    ///
    /// It can then be accessed with [`ListController::expect()`] from any child component.
    pub fn provide(&self) {
        provide_context(self.clone())
    }

    /// Extract a [`ListController`] out of leptos context.
    ///
    /// # Panics
    ///
    /// Panics if no controller for this transport has been provided by a parent component.
    #[track_caller]
    pub fn expect() -> Self {
        expect_context()
    }

    /// The reactive view state.
    pub fn state(&self) -> ArcRwSignal<ListViewState<T::Record>> {
        self.state.clone()
    }

    /// A copy of the current view state, without tracking.
    pub fn snapshot(&self) -> ListViewState<T::Record> {
        self.state.with_untracked(Clone::clone)
    }

    /// The accessor used for fetching.
    pub fn accessor(&self) -> &PaginatedAccessor<T> {
        &self.accessor
    }

    /// The page sizes to offer in the page-size selector.
    pub fn page_size_choices(&self) -> Vec<PageSize> {
        self.accessor.options().page_size_choices()
    }

    /// Apply `event`, spawning a fetch on the leptos executor if it calls for one.
    pub fn dispatch(&self, event: ListEvent<T::Record>) {
        if let Some(ticket) = self.apply(event) {
            let this = self.clone();
            leptos::task::spawn(async move {
                this.run(ticket).await;
            });
        }
    }

    /// Apply `event`, and if it calls for a fetch, wait for the fetch to land before returning.
    pub async fn dispatch_async(&self, event: ListEvent<T::Record>) {
        if let Some(ticket) = self.apply(event) {
            self.run(ticket).await;
        }
    }

    /// Load the current page for the first time.
    pub fn mount(&self) {
        self.dispatch(ListEvent::Mounted);
    }

    /// Jump to a page. Ignored if out of range.
    pub fn set_page(&self, page_number: u32) {
        self.dispatch(ListEvent::PageChanged(page_number));
    }

    /// Go to the next page, if there is one.
    pub fn next_page(&self) {
        let page_number = self.state.with_untracked(|state| state.page_number());
        self.set_page(page_number.saturating_add(1));
    }

    /// Go to the previous page, if there is one.
    pub fn prev_page(&self) {
        let page_number = self.state.with_untracked(|state| state.page_number());
        self.set_page(page_number.saturating_sub(1));
    }

    /// Change the page size, going back to page 1.
    pub fn set_page_size(&self, page_size: PageSize) {
        self.dispatch(ListEvent::PageSizeChanged(page_size));
    }

    /// Fetch the current page again.
    pub fn retry(&self) {
        self.dispatch(ListEvent::Retry);
    }

    fn apply(&self, event: ListEvent<T::Record>) -> Option<FetchTicket> {
        let mut ticket = None;
        self.state.update(|state| {
            let transition = state.reduce(event);
            *state = transition.state;
            ticket = transition.fetch;
        });
        ticket
    }

    async fn run(&self, ticket: FetchTicket) {
        let event = match self.accessor.list_page(ticket.request).await {
            Ok(result) => ListEvent::FetchSucceeded {
                generation: ticket.generation,
                result,
            },
            Err(error) => ListEvent::FetchFailed {
                generation: ticket.generation,
                error,
            },
        };
        // A result is never followed by another fetch:
        let _ = self.apply(event);
    }
}

impl<T> ListController<T>
where
    T: RecordMutations + 'static,
{
    /// Fetch a single record.
    pub async fn get(&self, id: &T::Id) -> Result<T::Detail, TransportError> {
        self.accessor.get(id).await
    }

    /// Create a record, then refetch the current page.
    pub async fn create(&self, draft: &T::Draft) -> Result<T::Detail, TransportError> {
        let created = self.accessor.transport().create(draft).await?;
        self.dispatch_async(ListEvent::MutationCompleted).await;
        Ok(created)
    }

    /// Replace a record, then refetch the current page.
    pub async fn update(&self, id: &T::Id, draft: &T::Draft) -> Result<T::Detail, TransportError> {
        let updated = self.accessor.transport().update(id, draft).await?;
        self.dispatch_async(ListEvent::MutationCompleted).await;
        Ok(updated)
    }

    /// Delete a record, then refetch the current page.
    ///
    /// The page number is left alone, even if the page is now past the end.
    pub async fn delete(&self, id: &T::Id) -> Result<(), TransportError> {
        self.accessor.transport().delete(id).await?;
        self.dispatch_async(ListEvent::MutationCompleted).await;
        Ok(())
    }
}
