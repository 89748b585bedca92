//! Router: single-agent selection by a swappable scoring strategy

pub mod decision;
pub mod scorer;
