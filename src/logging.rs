//! Система логирования с настройкой уровней через переменные окружения
//! Библиотека пишет через фасад `log`, бинарники подключают env_logger

use std::env;

/// Инициализация системы логирования
///
/// Уровень задаётся через RUST_LOG:
/// - RUST_LOG=warn - только предупреждения и ошибки
/// - RUST_LOG=info - ход анализа (по умолчанию)
/// - RUST_LOG=debug - детали по каждому полю
///
/// Для отдельного модуля:
/// ```bash
/// RUST_LOG=dslog_analytics::parser=debug analyze_log --log-file data/log.txt
/// ```
#[cfg(feature = "cli")]
pub fn init_logging() {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "info");
        }
    }

    // try_init: повторный вызов из тестов не паникует
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .format_module_path(true)
        .format_target(false)
        .try_init();

    log::debug!("✅ Logging initialised, level: {}", get_log_level());
}

/// Получить текущий уровень логирования
pub fn get_log_level() -> String {
    env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}
