//! API handlers for the acces service.

pub mod auth;
pub mod health;
pub mod me;
