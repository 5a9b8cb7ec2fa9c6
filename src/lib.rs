pub mod api;
pub mod businesses;
pub mod cli;
pub mod config;
pub mod database;
pub mod day;
pub mod error;
pub mod generations;
pub mod open_query;
pub mod query_input;
pub mod schedule;
pub mod schema;
pub mod server;
pub mod time_of_day;
pub mod upload;
