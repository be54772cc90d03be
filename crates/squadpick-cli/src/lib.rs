// Command-line front end: configuration, dataset loading, commands and reports.

pub mod commands;
pub mod config;
pub mod data;
pub mod report;
