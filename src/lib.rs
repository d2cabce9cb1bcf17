pub mod config;
pub mod error;
pub mod logging;

// Парсинг и признаки
pub mod features;
pub mod parser;

// События и статистика
pub mod events;
pub mod stats;

// Анализ, скоринг и отчёты
pub mod analytics;
pub mod report;
pub mod scoring_api;

pub mod tests;
