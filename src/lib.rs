//! School Bus Desk - Local Store and Dashboards
//!
//! A Rust library for the back office of a school-bus demo: a durable store
//! of named collections, a demo seeder, pure view renderers and the
//! controllers behind the admin, bus in-charge and student dashboards.
//!
//! # Features
//!
//! - Versioned, sled-backed collection store with an in-memory backend
//! - Demo dataset seeded per collection on first run
//! - Escaped HTML fragments for every dashboard region
//! - Typed actions with form state, delete confirmation and notifications
//! - Session guard with a permissive demo or strict redirect policy
//! - Login and registration against the backend API

/// Backend API client and auth flows
pub mod api;
/// Configuration management
pub mod config;
/// Dashboard controllers
pub mod controller;
/// Error types
pub mod error;
/// Store export
pub mod export;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Demo dataset
pub mod seed;
/// Session guard
pub mod session;
/// Persistent collection store
pub mod storage;
/// Debounce and clock tick
pub mod timers;
/// Identifier helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;
/// View rendering
pub mod view;

// Re-export key components for easier access
pub use config::AppConfig;
pub use controller::{AdminDashboard, InchargeDashboard, Notice, Outcome, StudentDashboard};
pub use error::{DeskError, Result};
pub use models::{AttendanceEntry, Bus, Complaint, FeeStatus, Notification, Role, Student};
pub use session::{SessionGuard, SessionPolicy};
pub use storage::{Collection, Store};
