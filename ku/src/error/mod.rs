use core::{
    fmt,
    result,
};

/// Перечисление для возможных ошибок.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// Попытка повторно захватить нерекурсивный мьютекс его же владельцем.
    Deadlock,

    /// У процесса не открыт мьютекс с заданным дескриптором.
    NotOpen,

    /// Номер дескриптора мьютекса выходит за пределы таблицы дескрипторов процесса.
    BadDescriptor,

    /// Таблица дескрипторов мьютексов процесса заполнена.
    DescriptorTableFull,

    /// Мьютекс с таким именем уже существует.
    DuplicateName,

    /// Не удалось загрузить образ памяти программы.
    ImageLoad,

    /// Задано недопустимое значение аргумента.
    InvalidArgument,

    /// Системного вызова с таким номером не существует.
    InvalidSyscall,

    /// Имя мьютекса длиннее [`crate::process::MAX_MUTEX_NAME`].
    NameTooLong,

    /// Мьютекса с заданным именем нет.
    NoMutex,

    /// Обращение к недоступной памяти процесса.
    NoPage,

    /// Нет свободного слота в таблице процессов.
    NoProcessSlot,

    /// Процесс не владеет мьютексом, который пытается освободить.
    NotOwner,
}

impl fmt::Display for Error {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        let message = match self {
            Error::Deadlock => "mutex is already locked by the caller",
            Error::NotOpen => "mutex descriptor is not open",
            Error::BadDescriptor => "mutex descriptor is out of range",
            Error::DescriptorTableFull => "no free mutex descriptor",
            Error::DuplicateName => "mutex name already exists",
            Error::ImageLoad => "failed to load the program image",
            Error::InvalidArgument => "invalid argument",
            Error::InvalidSyscall => "no such system call",
            Error::NameTooLong => "mutex name is too long",
            Error::NoMutex => "no mutex with such name",
            Error::NoPage => "inaccessible user memory",
            Error::NoProcessSlot => "no free process slot",
            Error::NotOwner => "mutex is not locked by the caller",
        };

        formatter.write_str(message)
    }
}

/// Тип возвращаемого результата `T` или ошибки [`Error`] ---
/// мономорфизация [`result::Result`] по типу ошибки.
pub type Result<T> = result::Result<T, Error>;
