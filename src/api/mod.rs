pub mod football;

pub use football::{ApiEnvelope, FixtureRow};
