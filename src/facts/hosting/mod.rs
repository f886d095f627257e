mod api;
mod client;
mod models;
mod pages;
mod rate_governor;

pub use api::GitHub;
pub use client::{Client, HostingApiResult, Page, RateLimitInfo};
pub use models::*;
pub use pages::paginate;
pub use rate_governor::RateGovernor;
