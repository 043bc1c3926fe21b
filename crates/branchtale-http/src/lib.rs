//! Branchtale: HTTP client for the story generation service.
//!
//! Implements the `StoryService` seam over the service's REST endpoints
//! using [`reqwest`].

mod client;

pub use client::{DEFAULT_BASE_URL, HttpError, HttpStoryService};
