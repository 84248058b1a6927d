pub mod auth;
pub mod banner;
pub mod commands;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod prompts;
pub mod review;
pub mod session;
pub mod source;
pub mod spinner;
