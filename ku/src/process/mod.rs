/// Именованные мьютексы: тип мьютекса и ограниченное по длине имя.
pub mod mutex;

/// Идентификатор процесса.
pub mod pid;

/// Константы для работы с системными вызовами.
pub mod syscall;

/// Учёт процессорного времени процесса.
pub mod times;

use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};

pub use mutex::{
    MAX_MUTEX_NAME,
    MutexKind,
    MutexName,
};
pub use pid::Pid;
pub use syscall::{
    ResultCode,
    Syscall,
};
pub use times::Times;

/// Верхняя граница на количество слотов в таблице процессов.
/// Определяется шириной [`crate::collections::ProcessSet`].
pub const MAX_PROCESS_SLOTS: usize = 64;

/// Максимальная длина имени программы, передаваемого в `create_process()`.
pub const MAX_PROGRAM_NAME: usize = 64;

/// Адрес порта ввода--вывода терминала.
pub const TERMINAL_PORT: u16 = 0x60;

/// Состояние слота таблицы процессов.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
#[repr(usize)]
pub enum State {
    /// Слот свободен.
    Unused = 0,

    /// Процесс готов к исполнению или исполняется.
    Ready = 1,

    /// Процесс ждёт события.
    Blocked = 2,

    /// Процесс завершился, его ресурсы освобождаются.
    Terminated = 3,
}
