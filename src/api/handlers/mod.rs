//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Business-intelligence analyst handlers.
pub mod bi;
/// Root and health check handlers.
pub mod health;
/// Tool listing and execution handlers.
pub mod tools;
/// Coaching session handlers.
pub mod workflow;
/// Workflow registry handlers.
pub mod workflows;
