pub mod batch;
pub mod config;
pub mod engine;
pub mod errlog;
pub mod humanize;
pub mod output;
pub mod pool;
pub mod progress;
pub mod scanner;
