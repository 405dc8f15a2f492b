//! # Atelier server
//! The HTTP face of the Atelier tailoring marketplace. It is responsible for:
//! * Establishing who the caller is, from the identity headers set by the upstream identity gateway.
//! * Exposing every marketplace operation (orders, reviews, conversations, profiles) as a JSON route.
//! * Streaming live snapshots of orders, conversations, reviews and ledgers as Server-Sent Events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The marketplace routes. Every one of them requires a signed, verified identity.
//! * `/api/live/...`: Server-Sent-Event streams. Each event carries a complete snapshot of the watched scope.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
