//! Data models for the ReelGuide application.
//!
//! These models match the frontend TypeScript interfaces for seamless interoperability.

mod feedback;
mod tag;
mod video;

pub use feedback::*;
pub use tag::*;
pub use video::*;
