use core::fmt;

use static_assertions::const_assert;

use crate::process::{
    MAX_PROCESS_SLOTS,
    Pid,
};

// ANCHOR: process_set
/// [Битовая карта](https://en.wikipedia.org/wiki/Free-space_bitmap)
/// процессов, индексированная слотами таблицы процессов.
///
/// Используется мьютексами для учёта открывших их процессов и
/// процессов, ожидающих их освобождения.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct ProcessSet(u64);
// ANCHOR_END: process_set

const_assert!(MAX_PROCESS_SLOTS <= u64::BITS as usize);

impl ProcessSet {
    /// Возвращает пустое множество.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Добавляет `pid` в множество.
    /// Возвращает `true`, если его там ещё не было.
    pub fn insert(
        &mut self,
        pid: Pid,
    ) -> bool {
        let inserted = !self.contains(pid);
        self.0 |= Self::bit(pid);
        inserted
    }

    /// Удаляет `pid` из множества.
    /// Возвращает `true`, если он там был.
    pub fn remove(
        &mut self,
        pid: Pid,
    ) -> bool {
        let removed = self.contains(pid);
        self.0 &= !Self::bit(pid);
        removed
    }

    /// Возвращает `true`, если `pid` входит в множество.
    pub fn contains(
        &self,
        pid: Pid,
    ) -> bool {
        self.0 & Self::bit(pid) != 0
    }

    /// Возвращает `true`, если множество пусто.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Количество процессов в множестве.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Итератор по процессам множества в порядке возрастания слотов.
    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        (0 .. MAX_PROCESS_SLOTS)
            .filter(|slot| self.0 & (1 << slot) != 0)
            .map(Pid::new)
    }

    /// Маска бита, соответствующего `pid`.
    fn bit(pid: Pid) -> u64 {
        1 << pid.slot()
    }
}

impl fmt::Debug for ProcessSet {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}
