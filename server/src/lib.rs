//! DogWorld marketplace server.
//!
//! Configuration loading and startup wiring for the `dogworld` binary.

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
