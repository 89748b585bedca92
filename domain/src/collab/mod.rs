//! Collaborative turn settings and contribution records

pub mod contribution;
pub mod settings;
