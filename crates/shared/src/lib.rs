//! Types shared between the movie client and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;
