//! API Module
//!
//! HTTP handlers and routing for the catalog REST API.
//!
//! # Endpoints
//! - `POST /items` - Create an item
//! - `GET /items/:item_id` - Read an item through the cache tiers
//! - `PUT /items/:item_id` - Update an item
//! - `DELETE /items/:item_id` - Delete an item
//! - `GET /stats` - Local cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
