//! HTTP API: forecasts, summaries, prediction commands and history queries.

pub mod app;
