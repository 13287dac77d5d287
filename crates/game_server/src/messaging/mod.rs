//! Message handling and routing for client-server communication.
//!
//! This module provides the infrastructure for validating client frames and
//! routing them to the world task.

pub mod router;

pub use router::{route_client_message, RoutingError};
