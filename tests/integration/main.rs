//! HTTP-level tests driving the full router against in-memory stores.

mod auth_test;
mod file_test;
mod helpers;
