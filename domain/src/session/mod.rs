//! Tutoring session, conversation, and message entities

pub mod entities;
