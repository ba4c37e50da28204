use alloc::vec::Vec;
use core::{
    fmt,
    ops::{
        Index,
        IndexMut,
    },
};

use ku::{
    MutexKind,
    MutexName,
    Pid,
    ProcessSet,
};

use crate::{
    error::{
        Error::Deadlock,
        Result,
    },
    sync::Section,
};

/// Номер слота глобальной таблицы мьютексов.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MutexId(usize);

impl MutexId {
    /// Идентификатор слота `slot`.
    pub fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// Номер слота.
    pub fn slot(self) -> usize {
        self.0
    }
}

impl fmt::Debug for MutexId {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Результат попытки захвата мьютекса.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Acquire {
    /// Мьютекс захвачен, вызывающий процесс --- его владелец.
    Locked,

    /// Мьютексом владеет другой процесс, нужно ждать.
    Busy,
}

// ANCHOR: mutex
/// Занятый слот глобальной таблицы мьютексов.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mutex {
    /// Уникальное среди занятых слотов имя.
    name: MutexName,

    /// Тип мьютекса.
    kind: MutexKind,

    /// Процессы, у которых мьютекс открыт.
    opened: ProcessSet,

    /// Процессы, заблокированные в ожидании мьютекса.
    waiters: ProcessSet,

    /// Текущий владелец.
    owner: Option<Pid>,

    /// Сколько раз владелец захватил мьютекс.
    holds: usize,
}
// ANCHOR_END: mutex

impl Mutex {
    /// Создаёт свободный мьютекс.
    fn new(
        name: MutexName,
        kind: MutexKind,
    ) -> Self {
        Self {
            name,
            kind,
            opened: ProcessSet::new(),
            waiters: ProcessSet::new(),
            owner: None,
            holds: 0,
        }
    }

    /// Имя мьютекса.
    pub fn name(&self) -> &MutexName {
        &self.name
    }

    /// Тип мьютекса.
    pub fn kind(&self) -> MutexKind {
        self.kind
    }

    /// Процессы, у которых мьютекс открыт.
    pub fn opened(&self) -> ProcessSet {
        self.opened
    }

    /// Процессы, ждущие мьютекс.
    pub fn waiters(&self) -> ProcessSet {
        self.waiters
    }

    /// Текущий владелец.
    pub fn owner(&self) -> Option<Pid> {
        self.owner
    }

    /// Количество захватов владельцем.
    pub fn holds(&self) -> usize {
        self.holds
    }

    /// Отмечает мьютекс открытым процессом `pid`.
    pub(super) fn open(
        &mut self,
        pid: Pid,
        _section: Section,
    ) {
        self.opened.insert(pid);
    }

    /// Снимает отметку об открытии процессом `pid`.
    /// Возвращает `true`, если мьютекс больше никем не открыт.
    pub(super) fn close(
        &mut self,
        pid: Pid,
        _section: Section,
    ) -> bool {
        self.opened.remove(pid);
        self.opened.is_empty()
    }

    /// Пытается захватить мьютекс для `pid`.
    ///
    /// Повторный захват владельцем рекурсивного мьютекса увеличивает счётчик захватов,
    /// а нерекурсивного --- возвращает ошибку [`crate::error::Error::Deadlock`].
    /// Если мьютексом владеет другой процесс, запоминает `pid` среди ожидающих.
    pub(super) fn try_lock(
        &mut self,
        pid: Pid,
        _section: Section,
    ) -> Result<Acquire> {
        match self.owner {
            None => {
                self.owner = Some(pid);
                self.holds = 1;
                self.waiters.remove(pid);
                Ok(Acquire::Locked)
            },
            Some(owner) if owner == pid => match self.kind {
                MutexKind::Recursive => {
                    self.holds += 1;
                    Ok(Acquire::Locked)
                },
                MutexKind::NonRecursive => Err(Deadlock),
            },
            Some(_) => {
                self.waiters.insert(pid);
                Ok(Acquire::Busy)
            },
        }
    }

    /// Снимает один захват владельца.
    /// Возвращает `true`, если мьютекс стал свободен.
    pub(super) fn unlock(
        &mut self,
        _section: Section,
    ) -> bool {
        self.holds -= 1;
        if self.holds == 0 {
            self.owner = None;
        }
        self.owner.is_none()
    }

    /// Снимает все захваты владельца разом.
    pub(super) fn release(
        &mut self,
        _section: Section,
    ) {
        self.owner = None;
        self.holds = 0;
    }

    /// Передаёт свободный мьютекс ожидающему процессу `pid`.
    pub(super) fn grant(
        &mut self,
        pid: Pid,
        _section: Section,
    ) {
        assert!(self.owner.is_none(), "mutex {} is still locked by {:?}", self.name, self.owner);
        assert!(self.waiters.remove(pid), "process {pid} does not wait for mutex {}", self.name);

        self.owner = Some(pid);
        self.holds = 1;
    }
}

/// Глобальная таблица мьютексов фиксированного размера.
///
/// Слот свободен ровно тогда, когда мьютекс в нём не открыт ни одним процессом.
#[derive(Debug)]
pub struct MutexTable {
    /// Слоты таблицы.
    slots: Vec<Option<Mutex>>,
}

impl MutexTable {
    /// Создаёт таблицу из `len` свободных слотов.
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0 .. len).map(|_| None).collect(),
        }
    }

    /// Ищет занятый слот с именем `name`.
    pub fn find(
        &self,
        name: &MutexName,
    ) -> Option<MutexId> {
        self.iter().find(|(_, mutex)| mutex.name() == name).map(|(id, _)| id)
    }

    /// Первый свободный слот.
    pub fn free_slot(&self) -> Option<MutexId> {
        self.slots.iter().position(Option::is_none).map(MutexId::new)
    }

    /// Возвращает `true`, если свободных слотов нет.
    pub fn is_full(&self) -> bool {
        self.free_slot().is_none()
    }

    /// Количество занятых слотов.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Возвращает `true`, если все слоты свободны.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Занимает свободный слот `id` новым мьютексом, открытым процессом `pid`.
    pub(super) fn occupy(
        &mut self,
        id: MutexId,
        name: MutexName,
        kind: MutexKind,
        pid: Pid,
        section: Section,
    ) {
        let slot = &mut self.slots[id.slot()];
        assert!(slot.is_none(), "mutex slot {id:?} is occupied");

        let mutex = slot.insert(Mutex::new(name, kind));
        mutex.open(pid, section);
    }

    /// Освобождает слот `id`.
    pub(super) fn free(
        &mut self,
        id: MutexId,
        _section: Section,
    ) -> Mutex {
        let mutex = self.slots[id.slot()].take();
        mutex.unwrap_or_else(|| panic!("mutex slot {id:?} is already free"))
    }

    /// Занятый слот `id`, если он занят.
    pub fn get(
        &self,
        id: MutexId,
    ) -> Option<&Mutex> {
        self.slots.get(id.slot())?.as_ref()
    }

    /// Итератор по занятым слотам.
    pub fn iter(&self) -> impl Iterator<Item = (MutexId, &Mutex)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, mutex)| Some((MutexId::new(slot), mutex.as_ref()?)))
    }
}

impl Index<MutexId> for MutexTable {
    type Output = Mutex;

    fn index(
        &self,
        id: MutexId,
    ) -> &Self::Output {
        self.get(id).unwrap_or_else(|| panic!("mutex slot {id:?} is free"))
    }
}

impl IndexMut<MutexId> for MutexTable {
    fn index_mut(
        &mut self,
        id: MutexId,
    ) -> &mut Self::Output {
        self.slots[id.slot()]
            .as_mut()
            .unwrap_or_else(|| panic!("mutex slot {id:?} is free"))
    }
}
