mod page_accessor;
mod page_request;

pub use page_accessor::*;
pub use page_request::*;
