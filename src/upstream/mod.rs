pub mod client;

pub use client::{status_message, FoodDataClient, UpstreamError, UpstreamStatus};
