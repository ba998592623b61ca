//! Offers: the aggregate service, address geocoding and the HTTP handlers.

pub mod geocoding;
pub mod handlers;
pub mod service;

pub use service::OfferService;
