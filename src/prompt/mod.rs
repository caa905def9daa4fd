pub mod constructor;

pub use constructor::{book_title, PageShape, PromptConstructor};
