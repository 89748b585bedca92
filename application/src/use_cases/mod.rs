//! Application use cases

pub mod collaborate;
pub mod route;
pub mod tutor_service;
