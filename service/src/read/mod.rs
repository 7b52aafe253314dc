//! Read entities definitions.

pub mod apartment;
pub mod client;
pub mod sale;
