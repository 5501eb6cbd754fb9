//! Browser glue. Everything here needs a DOM; the game rules it drives live
//! in the platform-free modules of the crate root.

pub mod app;
mod camera;
mod capture;
mod dom;
mod render;
mod socket;

pub use socket::socket_url;
