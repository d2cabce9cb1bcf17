//! Статистические примитивы для анализа полей

pub mod descriptive;
pub mod distributions;
pub mod inference;

pub use descriptive::*;
pub use distributions::*;
pub use inference::*;
