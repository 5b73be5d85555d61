#![forbid(unsafe_code)]

pub mod book;
pub mod build;
pub mod cli;
pub mod fetch;
pub mod formats;
pub mod formatters;
pub mod logging;
pub mod pipeline;
