pub mod routes;

// Re-export route handlers for convenience
pub use routes::businesses;
pub use routes::open;
pub use routes::schedules;
pub use routes::state::AppState;
