pub mod blink_counter;
pub mod config;
pub mod constants;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod monitor;
pub mod perception;
pub mod response;
pub mod routes;
pub mod state;
