//! Crawler module for page fetching and processing
//!
//! This module contains the page-level building blocks of the agent:
//! - HTTP fetching behind the [`Fetch`] trait
//! - HTML rendering to link-preserving text
//! - Link extraction confined to the allowed site

mod fetcher;
mod links;
mod render;

pub use fetcher::{build_http_client, Fetch, FetchError, HttpFetcher};
pub use links::{extract_links, DiscoveredLink};
pub use render::render_html;
