#![allow(clippy::type_complexity)]
#![warn(clippy::disallowed_types)]
#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
// When docs auto created for docs.rs, will include features, given docs.rs uses nightly by default:
#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]

mod error;
mod events;
#[cfg(feature = "http")]
mod http_transport;
mod list_controller;
mod models;
mod options;
mod pagination;
mod transport;
mod view_state;

pub use error::*;
pub use events::*;
#[cfg(feature = "http")]
pub use http_transport::*;
pub use list_controller::*;
pub use models::*;
pub use options::*;
pub use pagination::*;
pub use transport::{RecordMutations, RecordTransport};
pub use view_state::*;
