//! Centralized constants for the kua project.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod auth;
pub mod kubectl;
pub mod labels;
pub mod network;
pub mod paths;
pub mod rbac;
pub mod token;
