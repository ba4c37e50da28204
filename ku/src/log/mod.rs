//! Поддержка журналирования макросами библиотеки [`tracing`].
//!
//! Библиотека только порождает события журнала.
//! Подписчика, который их печатает, устанавливает окружение ---
//! например, интеграционные тесты через `tracing-subscriber`.

pub use tracing::{
    Level,
    debug,
    error,
    event,
    info,
    trace,
    warn,
};
