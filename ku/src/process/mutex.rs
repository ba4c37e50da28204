use core::{
    fmt,
    str,
};

use heapless::String;
use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};

use crate::error::{
    Error::{
        InvalidArgument,
        NameTooLong,
    },
    Result,
};

/// Максимальная длина имени мьютекса в байтах.
pub const MAX_MUTEX_NAME: usize = 8;

/// Тип мьютекса, задаётся при его создании.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
#[repr(usize)]
pub enum MutexKind {
    /// Повторный захват владельцем --- ошибка.
    NonRecursive = 0,

    /// Владелец может захватывать мьютекс повторно,
    /// ведётся счётчик захватов.
    Recursive = 1,
}

/// Имя мьютекса ограниченной длины.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MutexName(String<MAX_MUTEX_NAME>);

impl MutexName {
    /// Создаёт имя из строки `name`.
    ///
    /// Возвращает ошибки:
    ///   - [`crate::Error::InvalidArgument`] для пустого имени.
    ///   - [`crate::Error::NameTooLong`] если имя длиннее [`MAX_MUTEX_NAME`].
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(InvalidArgument);
        }

        let mut result = String::new();
        result.push_str(name).map_err(|_| NameTooLong)?;

        Ok(Self(result))
    }

    /// Создаёт имя из байт `name`, прочитанных из памяти процесса.
    ///
    /// Кроме ошибок [`MutexName::new()`], возвращает
    /// [`crate::Error::InvalidArgument`] если `name` --- не UTF-8.
    pub fn from_bytes(name: &[u8]) -> Result<Self> {
        if name.len() > MAX_MUTEX_NAME {
            return Err(NameTooLong);
        }

        Self::new(str::from_utf8(name).map_err(|_| InvalidArgument)?)
    }

    /// Имя в виде строки.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MutexName {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
