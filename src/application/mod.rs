//! Sitemap assembly: link resolution, record building, rendering and caching.

pub mod availability;
pub mod builder;
pub mod clock;
pub mod error;
pub mod links;
pub mod repos;
pub mod sitemap;
pub mod xml;
