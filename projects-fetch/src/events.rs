use core::fmt;

use chrono_humanize::HumanTime;

/// Something that happened to a list view, kept for display and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchEvent {
    /// When it happened.
    pub recorded_at: chrono::DateTime<chrono::Utc>,
    /// What happened.
    pub variant: FetchEventVariant,
}

impl FetchEvent {
    pub(crate) fn new(variant: FetchEventVariant) -> Self {
        Self {
            recorded_at: chrono::Utc::now(),
            variant,
        }
    }

    /// e.g. "fetched in 42ms, a few seconds ago".
    pub fn describe(&self) -> String {
        format!("{}, {}", self.variant, HumanTime::from(self.recorded_at))
    }
}

/// The kinds of [`FetchEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchEventVariant {
    /// A page arrived and is now displayed.
    Fetched {
        /// Round trip time.
        elapsed_ms: i64,
        /// The generation of the request.
        generation: u64,
    },
    /// The latest request failed.
    Failed {
        /// The generation of the request.
        generation: u64,
    },
    /// A response arrived for a request that had already been superseded, and was dropped.
    StaleDiscarded {
        /// The generation of the dropped response.
        generation: u64,
    },
    /// The collection was mutated and the page is being fetched again.
    Invalidated,
}

impl fmt::Display for FetchEventVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchEventVariant::Fetched { elapsed_ms, .. } => write!(f, "fetched in {}ms", elapsed_ms),
            FetchEventVariant::Failed { .. } => write!(f, "fetch failed"),
            FetchEventVariant::StaleDiscarded { generation } => {
                write!(f, "discarded stale response #{generation}")
            }
            FetchEventVariant::Invalidated => write!(f, "invalidated"),
        }
    }
}
