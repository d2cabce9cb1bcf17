//! Юнит-тесты библиотеки

pub mod analytics_tests;
pub mod fixtures;
pub mod parser_tests;
pub mod utils_tests;
