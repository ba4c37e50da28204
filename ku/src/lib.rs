//! Общая для пространств ядра и пользователя библиотека.
//! ku --- **k**ernel && **u**ser.
//!
//! Содержит то, о чём ядро и пользовательские программы должны договориться:
//! номера системных вызовов, коды ошибок, идентификаторы процессов,
//! типы и имена мьютексов, раскладку структуры с процессорным временем.

#![cfg_attr(not(test), no_std)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(missing_docs)]

/// Коллекции элементов.
pub mod collections;

/// Перечисление для возможных ошибок [`Error`] и соответствующий [`Result`].
pub mod error;

/// Поддержка журналирования макросами библиотеки [`tracing`].
pub mod log;

/// Здесь собраны функции и структуры для работы с процессами,
/// которые нужны и в ядре, и в пространстве пользователя.
pub mod process;

pub use collections::ProcessSet;
pub use error::{
    Error,
    Result,
};
pub use process::{
    MutexKind,
    MutexName,
    Pid,
    ResultCode,
    Syscall,
    Times,
};
