#![forbid(unsafe_code)]

pub mod catalog;
pub mod hints;
pub mod model;
pub mod scoring;
pub mod time;

pub use catalog::{Catalog, CatalogError, LessonFilter};
pub use hints::{HintError, HintGate, HintReveal, can_reveal};
pub use time::Clock;
