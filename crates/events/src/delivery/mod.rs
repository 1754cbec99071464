//! External delivery channels for rotation notifications.
//!
//! This module provides the SMTP email and chat webhook clients used by
//! [`RotationNotifier`](crate::RotationNotifier) to push outcomes to operators.

pub mod email;
pub mod webhook;
