//! The seam between the accessor and whatever actually stores the records.
//!
//! Uses edition 2024 `impl Future` in traits, so implementors can just write `async fn`.

use std::{fmt::Display, future::Future, num::NonZeroU32};

use serde::Deserialize;

use crate::{RecordPage, TransportError};

/// Fetches pages of a record collection.
pub trait RecordTransport: Send + Sync {
    /// The record type held by the collection. Opaque to the accessor.
    type Record: Send + Sync + 'static;

    /// Fetch a single page. `page_size` is always concrete, the sentinel has already been translated.
    fn list(
        &self,
        page_number: NonZeroU32,
        page_size: NonZeroU32,
    ) -> impl Future<Output = Result<RecordPage<Self::Record>, TransportError>> + Send;
}

/// Mutations against the same collection a [`RecordTransport`] lists.
pub trait RecordMutations: RecordTransport {
    /// The primary key of a record.
    type Id: Display + Clone + Send + Sync + 'static;
    /// The writable fields sent on create and update.
    type Draft: Send + Sync;
    /// The full record returned by single-record endpoints.
    type Detail: Send + Sync + 'static;

    /// Fetch one record.
    fn get(&self, id: &Self::Id) -> impl Future<Output = Result<Self::Detail, TransportError>> + Send;

    /// Create a record.
    fn create(
        &self,
        draft: &Self::Draft,
    ) -> impl Future<Output = Result<Self::Detail, TransportError>> + Send;

    /// Replace a record.
    fn update(
        &self,
        id: &Self::Id,
        draft: &Self::Draft,
    ) -> impl Future<Output = Result<Self::Detail, TransportError>> + Send;

    /// Delete a record. Success is signalled by the status alone.
    fn delete(&self, id: &Self::Id) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// The two shapes a list endpoint may answer with.
///
/// Only used to decode, [`ListResponse::into_page`] or [`ListResponse::into_items`] is called straight away
/// so nothing else has to care.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListResponse<Record> {
    Paginated { count: u64, results: Vec<Record> },
    Bare(Vec<Record>),
}

impl<Record> ListResponse<Record> {
    /// The requested page, never longer than `page_size`.
    ///
    /// A bare array is the whole collection, so the page is sliced out of it.
    pub(crate) fn into_page(self, page_number: NonZeroU32, page_size: NonZeroU32) -> RecordPage<Record> {
        let size = page_size.get() as usize;
        match self {
            ListResponse::Paginated { count, mut results } => {
                if results.len() > size {
                    tracing::warn!(
                        returned = results.len(),
                        page_size = size,
                        "backend returned more records than the page size, truncating"
                    );
                    results.truncate(size);
                }
                RecordPage {
                    items: results,
                    total_count: count,
                }
            }
            ListResponse::Bare(items) => {
                let total_count = items.len() as u64;
                let start = (page_number.get() as usize - 1).saturating_mul(size);
                RecordPage {
                    items: items.into_iter().skip(start).take(size).collect(),
                    total_count,
                }
            }
        }
    }

    /// Every record, whichever shape arrived.
    pub(crate) fn into_items(self) -> Vec<Record> {
        match self {
            ListResponse::Paginated { results, .. } => results,
            ListResponse::Bare(items) => items,
        }
    }
}
