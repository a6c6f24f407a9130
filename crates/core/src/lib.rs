//! Core business logic for Periodlock.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and transition guards live here.
//!
//! # Modules
//!
//! - `period` - Accounting period close/reopen lifecycle

pub mod period;
