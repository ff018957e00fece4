//! Request-level API surface around the aggregation engine.

pub mod api;
pub mod service;

pub use api::{
    requester_identity, ContentResponse, ErrorBody, ServiceError, ServiceResponse, CONTENT_TYPE_JSON,
};
pub use service::ContentService;
