//! Core business logic for foodify.
//!
//! Services sit between the HTTP layer and the repositories. Every officer
//! mutation goes through one of them so that email notifications and the
//! moderation log stay consistent.

pub mod services;

pub use services::*;
