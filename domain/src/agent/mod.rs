//! Tutor agent entities and the read-mostly agent directory

pub mod directory;
pub mod entities;
