//! HTTP request handlers, one module per resource.

pub mod revisions;
