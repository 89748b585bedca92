//! Prompt templates for tutoring turns

pub mod template;
