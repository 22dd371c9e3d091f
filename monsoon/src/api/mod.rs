//! Request boundary.
//!
//! Turns decoded request parameters into the one-line JSON envelope served
//! to map clients:
//!
//! ```json
//! {"payload": [["latitude", "longitude", "area"], [37.5, -122.25, 0.75]], "status": "OK"}
//! ```
//!
//! Routing and transport are left to the embedding server; the CLI drives
//! the same handler.

mod handler;
mod params;

pub use handler::{AccessHandler, Envelope, DEFAULT_LIMIT, DEFAULT_MAX_LIMIT};
pub use params::RequestParams;
