//! Report intake and browsing over HTTP.

pub mod geo;
pub mod media;
pub mod routes;

pub use media::MediaStore;
pub use routes::{AppState, report_routes};
