//! ccproxy - Context-aware model routing for LLM API traffic
//!
//! This library provides the routing core of ccproxy: a hot-reloadable
//! configuration store, an ordered rule table that classifies requests into
//! target models, the last-decision status slot, and a PID-file supervisor
//! for the traffic-capture process.

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod routing;
pub mod status;
pub mod supervisor;
