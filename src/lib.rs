//! Loading, caching, and trend filtering for first-name birth statistics.
//!
//! The desktop viewer (`name-trends`) and the headless `trend_query` tool
//! are thin front-ends over [`data`].

pub mod config;
pub mod data;
pub mod error;
