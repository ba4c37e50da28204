use alloc::{
    vec,
    vec::Vec,
};

use crate::error::{
    Error::{
        BadDescriptor,
        DescriptorTableFull,
        NotOpen,
    },
    Result,
};

use super::MutexId;

// Used in docs.
#[allow(unused)]
use crate::error::Error;

/// Таблица дескрипторов мьютексов процесса.
///
/// Дескриптор --- индекс в этой таблице.
/// Заполненный слот ссылается на слот глобальной таблицы мьютексов, но не владеет им.
/// Несколько дескрипторов могут ссылаться на один и тот же мьютекс.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Descriptors {
    /// Слоты таблицы.
    slots: Vec<Option<MutexId>>,
}

impl Descriptors {
    /// Создаёт пустую таблицу из `len` дескрипторов.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Количество открытых дескрипторов.
    pub fn count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Возвращает `true`, если свободных дескрипторов не осталось.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Возвращает `true`, если хотя бы один дескриптор ссылается на `mutex`.
    pub fn contains(
        &self,
        mutex: MutexId,
    ) -> bool {
        self.slots.contains(&Some(mutex))
    }

    /// Занимает наименьший свободный дескриптор под `mutex` и возвращает его.
    /// Если свободного нет, возвращает ошибку [`Error::DescriptorTableFull`].
    pub fn allocate(
        &mut self,
        mutex: MutexId,
    ) -> Result<usize> {
        let descriptor = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(DescriptorTableFull)?;

        self.slots[descriptor] = Some(mutex);

        Ok(descriptor)
    }

    /// Возвращает мьютекс, на который ссылается `descriptor`.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::BadDescriptor`] если `descriptor` выходит за пределы таблицы.
    ///   - [`Error::NotOpen`] если слот `descriptor` пуст.
    pub fn get(
        &self,
        descriptor: usize,
    ) -> Result<MutexId> {
        self.slots
            .get(descriptor)
            .ok_or(BadDescriptor)?
            .ok_or(NotOpen)
    }

    /// Освобождает `descriptor` и возвращает мьютекс, на который он ссылался.
    /// Ошибки те же, что у [`Descriptors::get()`].
    pub fn release(
        &mut self,
        descriptor: usize,
    ) -> Result<MutexId> {
        let mutex = self.get(descriptor)?;
        self.slots[descriptor] = None;
        Ok(mutex)
    }

    /// Освобождает первый открытый дескриптор.
    /// Возвращает его и мьютекс, на который он ссылался,
    /// или [`None`], если открытых дескрипторов не осталось.
    pub fn pop(&mut self) -> Option<(usize, MutexId)> {
        let (descriptor, mutex) = self.iter().next()?;
        self.slots[descriptor] = None;
        Some((descriptor, mutex))
    }

    /// Итератор по открытым дескрипторам и мьютексам, на которые они ссылаются.
    pub fn iter(&self) -> impl Iterator<Item = (usize, MutexId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(descriptor, mutex)| mutex.map(|mutex| (descriptor, mutex)))
    }
}
