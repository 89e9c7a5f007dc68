//! Triton - static file HTTP/1.1 server
//!
//! Core library for the connection handler, request parsing, virtual host
//! routing and response serialization.

pub mod config;
pub mod http;
pub mod server;
