//! End-to-end tests against a live server backed by the memory gateway.

mod helpers;
mod http_test;
mod realtime_test;
