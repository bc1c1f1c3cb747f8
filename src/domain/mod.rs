//! Domain models for the case ABAC engine

pub mod abac;
pub mod common;
pub mod policy;
pub mod user;

pub use abac::*;
pub use common::*;
pub use policy::*;
pub use user::*;
