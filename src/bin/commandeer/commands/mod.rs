//! Command implementations

pub mod doctor;
pub mod preview;
pub mod status;
