use core::fmt;

use static_assertions::const_assert;

use crate::error::{
    Error::InvalidArgument,
    Result,
};

use super::MAX_PROCESS_SLOTS;

// ANCHOR: pid
/// Идентификатор процесса.
///
/// Совпадает с номером слота процесса в таблице процессов,
/// так что процесс находится по своему идентификатору за `O(1)`.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pid(u16);
// ANCHOR_END: pid

const_assert!(MAX_PROCESS_SLOTS <= u16::MAX as usize);

impl Pid {
    /// Создаёт [`Pid`] для слота `slot` таблицы процессов.
    ///
    /// # Panics
    ///
    /// Паникует, если `slot` не меньше [`MAX_PROCESS_SLOTS`].
    pub fn new(slot: usize) -> Self {
        assert!(slot < MAX_PROCESS_SLOTS, "process slot {slot} is out of range");
        Self(slot as u16)
    }

    /// Позволяет десериализовать [`Pid`] из регистра при передаче в системные вызовы.
    pub fn from_usize(pid: usize) -> Result<Self> {
        if pid < MAX_PROCESS_SLOTS {
            Ok(Self(pid as u16))
        } else {
            Err(InvalidArgument)
        }
    }

    /// Позволяет сериализовать [`Pid`] в регистр при передаче из системных вызовов.
    pub fn into_usize(self) -> usize {
        self.0.into()
    }

    /// Номер слота в таблице процессов.
    pub fn slot(self) -> usize {
        self.0.into()
    }
}

impl fmt::Debug for Pid {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        (self as &dyn fmt::Display).fmt(formatter)
    }
}

impl fmt::Display for Pid {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
