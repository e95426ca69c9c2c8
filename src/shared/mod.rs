//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the gateway, worker and notification services. These types define the
//! wire formats used for WebSocket communication and for payloads on the
//! relay queue.
//!
//! # Overview
//!
//! The shared module provides service-agnostic types designed for
//! serialization: the chat message model, the socket protocol events, the
//! notification frame, and common validation errors.

/// Message data structure
pub mod message;

/// Socket protocol events and notification frames
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use event::{ClientEvent, NotificationFrame, ServerEvent};
pub use message::Message;
