//! Shared types, auth claims, and configuration for Periodlock.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for tenants, users, and period events
//! - JWT claims and token service
//! - Configuration management

pub mod auth;
pub mod config;
pub mod jwt;
pub mod types;


pub use auth::Claims;
pub use config::AppConfig;
pub use jwt::{JwtConfig, JwtError, JwtService};
