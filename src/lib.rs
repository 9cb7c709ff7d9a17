//! Almanac Library
//!
//! Computes sunrise, sunset, solar transit and lunar phase data for an
//! observer over a window of days, caches the rendered JSON document per
//! location and serves it through a CGI adapter.

pub mod builder;
pub mod cache;
pub mod cgi;
pub mod cli;
pub mod data;
pub mod ephemeris;
pub mod location;
pub mod response;
pub mod service;
pub mod window;
