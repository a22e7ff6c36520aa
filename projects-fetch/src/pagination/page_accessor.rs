use std::{sync::Arc, time::Instant};

use crate::{
    AccessorOptions, PageRequest, PageResult, PageSize, RecordMutations, RecordTransport,
    TransportError, total_pages,
};

/// Lists a record collection one page at a time.
///
/// Every call is a fresh round trip to the transport: nothing is cached between pages, and nothing is retried.
#[derive(Debug)]
pub struct PaginatedAccessor<T> {
    transport: Arc<T>,
    options: AccessorOptions,
}

impl<T> Clone for PaginatedAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            options: self.options.clone(),
        }
    }
}

impl<T: RecordTransport> PaginatedAccessor<T> {
    /// Create a new [`PaginatedAccessor`] with default options.
    pub fn new(transport: T) -> Self {
        Self::new_with_options(transport, AccessorOptions::default())
    }

    /// Create a new [`PaginatedAccessor`] with custom options.
    pub fn new_with_options(transport: T, options: AccessorOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            options,
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The options this accessor was built with.
    pub fn options(&self) -> &AccessorOptions {
        &self.options
    }

    /// Fetch one page with exactly one transport call.
    ///
    /// [`PageSize::All`] is sent as [`AccessorOptions::unbounded_page_size`].
    /// On failure nothing is returned, the caller should keep showing whatever it showed before.
    pub async fn list_page(&self, request: PageRequest) -> Result<PageResult<T::Record>, TransportError> {
        let unbounded = self.options.unbounded_page_size();
        let effective_size = request.page_size().effective(unbounded);

        tracing::debug!(
            page_number = request.page_number().get(),
            page_size = %request.page_size(),
            effective_size = effective_size.get(),
            "listing page"
        );

        let started = Instant::now();
        let page = match self
            .transport
            .list(request.page_number(), effective_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    page_number = request.page_number().get(),
                    error = %e,
                    "listing page failed"
                );
                return Err(e);
            }
        };
        let elapsed_ms = started.elapsed().as_millis().min(i64::MAX as u128) as i64;

        if request.page_size() == PageSize::All && page.total_count > u64::from(unbounded.get()) {
            tracing::warn!(
                total_count = page.total_count,
                unbounded_page_size = unbounded.get(),
                "collection is larger than the unbounded page size, showing a truncated page"
            );
        }

        Ok(PageResult {
            request,
            total_pages: total_pages(
                page.total_count,
                request.page_size(),
                unbounded,
                self.options.unbounded_page_count(),
            ),
            total_count: page.total_count,
            items: page.items.into(),
            fetched_at: chrono::Utc::now(),
            elapsed_ms,
        })
    }

    /// Re-fetch a page after the collection changed.
    ///
    /// A plain [`Self::list_page`] with the same request. The page number isn't clamped, if the page
    /// no longer exists the transport's answer (usually no items and a smaller count) is returned as-is.
    pub async fn invalidate_after_mutation(
        &self,
        request: PageRequest,
    ) -> Result<PageResult<T::Record>, TransportError> {
        tracing::debug!(
            page_number = request.page_number().get(),
            "refetching page after mutation"
        );
        self.list_page(request).await
    }
}

/// The outcome of a mutation followed by a refetch of the displayed page.
#[derive(Debug)]
pub struct Mutated<Output, Record> {
    /// What the mutation itself returned.
    pub output: Output,
    /// The displayed page, fetched again after the mutation.
    ///
    /// The mutation can succeed while this refetch fails, the caller decides what to show then.
    pub page: Result<PageResult<Record>, TransportError>,
}

impl<T: RecordMutations> PaginatedAccessor<T> {
    /// Fetch a single record.
    pub async fn get(&self, id: &T::Id) -> Result<T::Detail, TransportError> {
        self.transport.get(id).await
    }

    /// Create a record, then refetch `displayed`.
    pub async fn create(
        &self,
        draft: &T::Draft,
        displayed: PageRequest,
    ) -> Result<Mutated<T::Detail, T::Record>, TransportError> {
        let output = self.transport.create(draft).await?;
        let page = self.invalidate_after_mutation(displayed).await;
        Ok(Mutated { output, page })
    }

    /// Replace a record, then refetch `displayed`.
    pub async fn update(
        &self,
        id: &T::Id,
        draft: &T::Draft,
        displayed: PageRequest,
    ) -> Result<Mutated<T::Detail, T::Record>, TransportError> {
        let output = self.transport.update(id, draft).await?;
        let page = self.invalidate_after_mutation(displayed).await;
        Ok(Mutated { output, page })
    }

    /// Delete a record, then refetch `displayed`.
    pub async fn delete(
        &self,
        id: &T::Id,
        displayed: PageRequest,
    ) -> Result<Mutated<(), T::Record>, TransportError> {
        self.transport.delete(id).await?;
        let page = self.invalidate_after_mutation(displayed).await;
        Ok(Mutated { output: (), page })
    }
}
