pub mod application;
pub mod candidate;
pub mod offer;
pub mod reference;
pub mod user;
