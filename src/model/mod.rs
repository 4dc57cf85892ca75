//! The data the pipeline works on: videos, their streams and the format catalog.

pub mod candidate;
pub mod catalog;
pub mod item;
pub mod selector;

pub use candidate::MediaCandidate;
pub use item::{MediaItem, State};
pub use selector::Quality;
