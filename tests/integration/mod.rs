//! Integration tests: HTTP clients against a mock server, the collector with
//! fake providers, and Postgres persistence

mod data_collector;
