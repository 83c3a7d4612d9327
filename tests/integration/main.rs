//! Integration tests for the public scan API.

mod scan;
mod http_client;
