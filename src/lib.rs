pub mod analyzers;
pub mod chart;
pub mod config;
pub mod contribute;
pub mod dates;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod records;
pub mod services;
pub mod stats;
