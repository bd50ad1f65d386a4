pub mod cli;
pub mod client;
pub mod config;
pub mod jobs;
pub mod locator;
pub mod storage;
pub mod web;
