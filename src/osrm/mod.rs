mod client;
pub mod polyline;
mod response;

pub use client::OsrmClient;
