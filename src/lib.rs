//! Margin suggestions for grocery products from market signals.
//!
//! `engine` is pure computation; `fetcher` and `processor` gather and score
//! the signals; `report` renders one run for the terminal.

pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod processor;
pub mod report;
