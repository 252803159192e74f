//! Request context handed to middlewares, hooks and handlers.

mod context;

pub use context::{Context, RequestId, REQUEST_ID_HEADER};
