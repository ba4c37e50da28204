use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};

use crate::error::{
    Error,
    Result,
};

/// Номера системных вызовов.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
#[repr(usize)]
pub enum Syscall {
    /// Номер системного вызова `create_process()`.
    CreateProcess = 0,

    /// Номер системного вызова `exit()`.
    Exit = 1,

    /// Номер системного вызова `write()`.
    Write = 2,

    /// Номер системного вызова `getpid()`.
    GetPid = 3,

    /// Номер системного вызова `sleep()`.
    Sleep = 4,

    /// Номер системного вызова `times()`.
    Times = 5,

    /// Номер системного вызова `create_mutex()`.
    CreateMutex = 6,

    /// Номер системного вызова `open_mutex()`.
    OpenMutex = 7,

    /// Номер системного вызова `lock()`.
    Lock = 8,

    /// Номер системного вызова `unlock()`.
    Unlock = 9,

    /// Номер системного вызова `close_mutex()`.
    CloseMutex = 10,

    /// Номер системного вызова `read_char()`.
    ReadChar = 11,
}

impl Syscall {
    /// Количество зарегистрированных системных вызовов.
    pub const COUNT: usize = Syscall::ReadChar as usize + 1;
}

/// Код ошибки, возвращаемый из системных вызовов.
///
/// Все коды отрицательны, поэтому неотрицательные значения результата
/// системного вызова --- идентификаторы, дескрипторы, символы и счётчики ---
/// передаются в том же регистре без изменений.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
#[repr(isize)]
pub enum ResultCode {
    /// Код для [`Error::InvalidSyscall`].
    InvalidSyscall = -1,

    /// Код для [`Error::NoProcessSlot`].
    NoProcessSlot = -2,

    /// Код для [`Error::ImageLoad`].
    ImageLoad = -3,

    /// Код для [`Error::DescriptorTableFull`].
    DescriptorTableFull = -4,

    /// Код для [`Error::NameTooLong`].
    NameTooLong = -5,

    /// Код для [`Error::DuplicateName`].
    DuplicateName = -6,

    /// Код для [`Error::NoMutex`].
    NoMutex = -7,

    /// Код для [`Error::BadDescriptor`].
    BadDescriptor = -8,

    /// Код для [`Error::NotOpen`].
    NotOpen = -9,

    /// Код для [`Error::NotOwner`].
    NotOwner = -10,

    /// Код для [`Error::Deadlock`].
    Deadlock = -11,

    /// Код для [`Error::InvalidArgument`] и [`Error::NoPage`].
    InvalidArgument = -12,
}

impl ResultCode {
    /// Упаковывает результат системного вызова в значение регистра.
    pub fn encode(result: Result<usize>) -> usize {
        match result {
            Ok(value) => value,
            Err(error) => isize::from(ResultCode::from(error)) as usize,
        }
    }

    /// Распаковывает значение регистра, записанное [`ResultCode::encode()`].
    pub fn decode(value: usize) -> Result<usize> {
        match ResultCode::try_from(value as isize) {
            Ok(code) => Err(code.into()),
            Err(_) => Ok(value),
        }
    }
}

impl From<Error> for ResultCode {
    fn from(error: Error) -> ResultCode {
        match error {
            Error::Deadlock => ResultCode::Deadlock,
            Error::NotOpen => ResultCode::NotOpen,
            Error::BadDescriptor => ResultCode::BadDescriptor,
            Error::DescriptorTableFull => ResultCode::DescriptorTableFull,
            Error::DuplicateName => ResultCode::DuplicateName,
            Error::ImageLoad => ResultCode::ImageLoad,
            Error::InvalidArgument | Error::NoPage => ResultCode::InvalidArgument,
            Error::InvalidSyscall => ResultCode::InvalidSyscall,
            Error::NameTooLong => ResultCode::NameTooLong,
            Error::NoMutex => ResultCode::NoMutex,
            Error::NoProcessSlot => ResultCode::NoProcessSlot,
            Error::NotOwner => ResultCode::NotOwner,
        }
    }
}

impl From<ResultCode> for Error {
    fn from(code: ResultCode) -> Error {
        match code {
            ResultCode::InvalidSyscall => Error::InvalidSyscall,
            ResultCode::NoProcessSlot => Error::NoProcessSlot,
            ResultCode::ImageLoad => Error::ImageLoad,
            ResultCode::DescriptorTableFull => Error::DescriptorTableFull,
            ResultCode::NameTooLong => Error::NameTooLong,
            ResultCode::DuplicateName => Error::DuplicateName,
            ResultCode::NoMutex => Error::NoMutex,
            ResultCode::BadDescriptor => Error::BadDescriptor,
            ResultCode::NotOpen => Error::NotOpen,
            ResultCode::NotOwner => Error::NotOwner,
            ResultCode::Deadlock => Error::Deadlock,
            ResultCode::InvalidArgument => Error::InvalidArgument,
        }
    }
}
