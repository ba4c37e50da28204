//! Ядро только порождает события журнала макросами библиотеки [`tracing`].
//! Подписчика устанавливает окружение, в котором ядро запущено.

pub use ku::log::{
    Level,
    debug,
    error,
    event,
    info,
    trace,
    warn,
};
