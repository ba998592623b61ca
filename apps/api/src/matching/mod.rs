//! Offer matching: feature extraction for candidates and offers, payload assembly, and the
//! external ranking collaborator.

pub mod builder;
pub mod client;
pub mod features;
pub mod handlers;
pub mod service;

pub use service::MatchingService;
