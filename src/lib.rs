pub mod api;
pub mod csv_store;
pub mod data_collector;
pub mod database;
pub mod financials;
pub mod models;
