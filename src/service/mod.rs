//! Business logic layer

pub mod abac;

pub use abac::AbacService;
