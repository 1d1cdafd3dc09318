//! Library exports for the visit map service
//!
//! This module exposes internal components for testing and potential library usage.

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod favorites;
pub mod handler;
pub mod map;
pub mod middleware;
pub mod model;
pub mod posts;
pub mod route;
pub mod visits;
