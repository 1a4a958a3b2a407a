// Инициализация логирования для приложений, встраивающих пул.
//
// Сам пул пишет только через макросы `tracing` и ничего не настраивает:
// без подписчика сообщения просто отбрасываются. Эти функции нужны
// хосту (и тестам), которые хотят видеть логи пула.
//
// ```rust
// use affinity_pool::logging;
//
// logging::init_default();
// // или
// logging::init(logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     target_filters: Some("affinity_pool::affinity=trace".to_string()),
//     ..Default::default()
// });
// ```

use std::io::IsTerminal;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Минимальный уровень
    pub level: Level,
    pub show_file_line: bool,
    /// Имя и id потока: воркеры пула именуются `<prefix>-<index>`.
    pub show_thread_info: bool,
    /// Дополнительные директивы в формате `target=level,target2=level2`
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            show_file_line: false,
            show_thread_info: true,
            target_filters: None,
        }
    }
}

static INIT: Once = Once::new();

/// Устанавливает глобального подписчика. Срабатывает только первый вызов;
/// `RUST_LOG` учитывается.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());

        if let Some(filters) = config.target_filters {
            for filter in filters.split(',') {
                if let Ok(directive) = filter.trim().parse() {
                    env_filter = env_filter.add_directive(directive);
                }
            }
        }

        let fmt_layer = fmt::layer()
            .with_ansi(std::io::stdout().is_terminal())
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let subscriber = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Error setting global tracing subscriber: {}", err);
        }
    });
}

pub fn init_default() {
    init(LogConfig::default());
}

/// Только предупреждения и ошибки: неудачные привязки к ядрам и паники
/// detached-задач остаются видны, остальное не засоряет вывод тестов.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        show_file_line: true,
        show_thread_info: false,
        target_filters: None,
    });
}

pub use tracing::{debug, error, info, trace, warn};
