use std::{num::NonZeroU32, time::Duration};

use crate::PageSize;

pub(crate) const DEFAULT_UNBOUNDED_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(1000).unwrap();
pub(crate) const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(10).unwrap();
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable read by [`TransportOptions::from_env`] for the backend base url.
pub const BASE_URL_ENV: &str = "PROJECTS_API_URL";
/// Environment variable read by [`TransportOptions::from_env`] for the request timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "PROJECTS_API_TIMEOUT_SECS";

/// How many total pages to report when [`PageSize::All`] was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnboundedPageCount {
    /// Always report a single page, whatever the total count.
    ///
    /// If the backend holds more rows than the unbounded page size, the page is silently truncated,
    /// a warning is logged when that happens.
    #[default]
    AlwaysOne,
    /// Compute the page count against the unbounded page size like any other size.
    Computed,
}

/// Configuration for [`crate::PaginatedAccessor`] and [`crate::ListViewState`].
#[derive(Debug, Clone, Default)]
pub struct AccessorOptions {
    unbounded_page_size: Option<NonZeroU32>,
    unbounded_page_count: Option<UnboundedPageCount>,
    default_page_size: Option<PageSize>,
    page_size_choices: Option<Vec<PageSize>>,
}

impl AccessorOptions {
    /// Create new [`AccessorOptions`] with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size actually sent to the backend when [`PageSize::All`] is requested.
    ///
    /// Default: `1000`
    #[track_caller]
    pub fn set_unbounded_page_size(mut self, size: NonZeroU32) -> Self {
        self.unbounded_page_size = Some(size);
        self
    }

    /// Set how the total page count is derived for [`PageSize::All`].
    ///
    /// Default: [`UnboundedPageCount::AlwaysOne`]
    #[track_caller]
    pub fn set_unbounded_page_count(mut self, policy: UnboundedPageCount) -> Self {
        self.unbounded_page_count = Some(policy);
        self
    }

    /// Set the page size a fresh list view starts with.
    ///
    /// Default: `10`
    #[track_caller]
    pub fn set_default_page_size(mut self, size: PageSize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    /// Set the page sizes offered to the user.
    ///
    /// Default: `5, 10, 20, 50, All`
    #[track_caller]
    pub fn set_page_size_choices(mut self, choices: impl IntoIterator<Item = PageSize>) -> Self {
        self.page_size_choices = Some(choices.into_iter().collect());
        self
    }

    /// The page size sent to the backend when [`PageSize::All`] is requested.
    ///
    /// Default: `1000`
    pub fn unbounded_page_size(&self) -> NonZeroU32 {
        self.unbounded_page_size
            .unwrap_or(DEFAULT_UNBOUNDED_PAGE_SIZE)
    }

    /// How the total page count is derived for [`PageSize::All`].
    ///
    /// Default: [`UnboundedPageCount::AlwaysOne`]
    pub fn unbounded_page_count(&self) -> UnboundedPageCount {
        self.unbounded_page_count.unwrap_or_default()
    }

    /// The page size a fresh list view starts with.
    ///
    /// Default: `10`
    pub fn default_page_size(&self) -> PageSize {
        self.default_page_size
            .unwrap_or(PageSize::Fixed(DEFAULT_PAGE_SIZE))
    }

    /// The page sizes offered to the user.
    ///
    /// Default: `5, 10, 20, 50, All`
    pub fn page_size_choices(&self) -> Vec<PageSize> {
        match &self.page_size_choices {
            Some(choices) => choices.clone(),
            None => [5, 10, 20, 50]
                .into_iter()
                .filter_map(PageSize::fixed)
                .chain(std::iter::once(PageSize::All))
                .collect(),
        }
    }
}

/// Configuration for [`crate::HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl TransportOptions {
    /// Create new [`TransportOptions`] with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from the environment, falling back to the defaults for anything unset or unparsable.
    ///
    /// - `PROJECTS_API_URL`: the backend base url.
    /// - `PROJECTS_API_TIMEOUT_SECS`: the request timeout in whole seconds.
    pub fn from_env() -> Self {
        let mut options = Self::new();
        if let Ok(base_url) = std::env::var(BASE_URL_ENV)
            && !base_url.trim().is_empty()
        {
            options = options.set_base_url(base_url);
        }
        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => options = options.set_timeout(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable {TIMEOUT_ENV}"),
            }
        }
        options
    }

    /// Set the base url of the backend, without a trailing path.
    ///
    /// Default: `http://localhost:8000`
    #[track_caller]
    pub fn set_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the timeout applied to every request.
    ///
    /// Default: `30 seconds`
    #[track_caller]
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The base url of the backend, trailing slashes removed.
    ///
    /// Default: `http://localhost:8000`
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// The timeout applied to every request.
    ///
    /// Default: `30 seconds`
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_defaults() {
        let options = AccessorOptions::new();
        assert_eq!(options.unbounded_page_size().get(), 1000);
        assert_eq!(options.unbounded_page_count(), UnboundedPageCount::AlwaysOne);
        assert_eq!(options.default_page_size(), PageSize::fixed(10).unwrap());
        assert_eq!(
            options.page_size_choices(),
            vec![
                PageSize::fixed(5).unwrap(),
                PageSize::fixed(10).unwrap(),
                PageSize::fixed(20).unwrap(),
                PageSize::fixed(50).unwrap(),
                PageSize::All,
            ]
        );
    }

    #[test]
    fn test_accessor_overrides() {
        let options = AccessorOptions::new()
            .set_unbounded_page_size(NonZeroU32::new(250).unwrap())
            .set_unbounded_page_count(UnboundedPageCount::Computed)
            .set_default_page_size(PageSize::All)
            .set_page_size_choices([PageSize::All]);
        assert_eq!(options.unbounded_page_size().get(), 250);
        assert_eq!(options.unbounded_page_count(), UnboundedPageCount::Computed);
        assert_eq!(options.default_page_size(), PageSize::All);
        assert_eq!(options.page_size_choices(), vec![PageSize::All]);
    }

    #[test]
    fn test_transport_base_url_trims_trailing_slash() {
        assert_eq!(TransportOptions::new().base_url(), "http://localhost:8000");
        let options = TransportOptions::new().set_base_url("https://api.example.org/");
        assert_eq!(options.base_url(), "https://api.example.org");
        assert_eq!(options.timeout(), Duration::from_secs(30));
    }
}
