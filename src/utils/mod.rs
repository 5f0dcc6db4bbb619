//! Shared utilities.
//!
//! - [`email`]: email templates and the [`Mailer`](email::Mailer) implementations

pub mod email;
