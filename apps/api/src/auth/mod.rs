//! Actor resolution and the single authorization guard every service consults.

pub mod guard;

pub use guard::{authorize, Action, Actor, Resource};
