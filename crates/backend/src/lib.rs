//! # Medir Backend
//!
//! HTTP adapters for the hosted backend the directory runs on:
//! - [`RestStore`]: a PostgREST table client implementing [`medir_core::DataStore`]
//! - [`EdgeMatchingService`]: the doctors-by-pathology edge function, implementing
//!   [`medir_core::MatchingService`]
//!
//! Both share one [`BackendClient`], which carries the base URL and credentials from
//! [`medir_core::DiscoveryConfig`].

mod client;
pub mod edge;
pub mod rest;

pub use client::{BackendClient, BackendError};
pub use edge::EdgeMatchingService;
pub use rest::RestStore;
