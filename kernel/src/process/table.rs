use alloc::vec::Vec;
use core::ops::{
    Index,
    IndexMut,
};

use ku::process::State;

use crate::{
    error::{
        Error::NoProcessSlot,
        Result,
    },
    hal::Hardware,
    log::info,
};

use super::{
    Pid,
    Process,
};

// Used in docs.
#[allow(unused)]
use crate::error::Error;

/// Таблица процессов.
///
/// Идентификатор процесса совпадает с номером его слота,
/// а свободный слот соответствует состоянию [`State::Unused`].
pub struct Table<H: Hardware> {
    /// Слоты таблицы процессов.
    table: Vec<Option<Process<H>>>,
}

impl<H: Hardware> Table<H> {
    /// Создаёт таблицу процессов [`Table`] из `len` свободных слотов.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            table: (0 .. len).map(|_| None).collect(),
        }
    }

    /// Количество слотов таблицы.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Возвращает `true`, если в таблице нет слотов.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Количество занятых слотов.
    pub fn process_count(&self) -> usize {
        self.table.iter().flatten().count()
    }

    /// Возвращает первый свободный слот.
    /// Если свободного слота нет, возвращает ошибку [`Error::NoProcessSlot`].
    pub(crate) fn find_free(&self) -> Result<Pid> {
        self.table
            .iter()
            .position(Option::is_none)
            .map(Pid::new)
            .ok_or(NoProcessSlot)
    }

    /// Помещает `process` в свободный слот `pid`.
    pub(crate) fn occupy(
        &mut self,
        pid: Pid,
        process: Process<H>,
    ) {
        let slot = &mut self.table[pid.slot()];
        assert!(slot.is_none(), "process slot {pid} is occupied");
        *slot = Some(process);

        info!(%pid, process_count = self.process_count(), "allocate");
    }

    /// Освобождает слот `pid` и возвращает находившийся в нём процесс.
    pub(crate) fn free(
        &mut self,
        pid: Pid,
    ) -> Process<H> {
        let process = self.table[pid.slot()]
            .take()
            .unwrap_or_else(|| panic!("process slot {pid} is already free"));

        info!(%pid, process_count = self.process_count(), "free");

        process
    }

    /// Процесс `pid`, если слот занят.
    pub fn get(
        &self,
        pid: Pid,
    ) -> Option<&Process<H>> {
        self.table.get(pid.slot())?.as_ref()
    }

    /// Состояние слота `pid`.
    pub fn state(
        &self,
        pid: Pid,
    ) -> State {
        self.get(pid).map_or(State::Unused, Process::state)
    }

    /// Итератор по занятым слотам.
    pub fn iter(&self) -> impl Iterator<Item = (Pid, &Process<H>)> + '_ {
        self.table
            .iter()
            .enumerate()
            .filter_map(|(slot, process)| Some((Pid::new(slot), process.as_ref()?)))
    }

    /// Возвращает контекст `save` для сохранения текущего состояния и
    /// контекст `load`, который нужно восстановить.
    ///
    /// # Panics
    ///
    /// Паникует, если `save` и `load` совпадают или какой-то из слотов свободен.
    pub(crate) fn contexts(
        &mut self,
        save: Option<Pid>,
        load: Pid,
    ) -> (Option<&mut H::Context>, &H::Context) {
        let Some(save) = save else {
            return (None, &self[load].context);
        };

        assert_ne!(save, load, "can not switch process {save} to itself");

        let (low, high) = self.table.split_at_mut(save.slot().max(load.slot()));
        let (save_slot, load_slot) = if save < load {
            (&mut low[save.slot()], &high[0])
        } else {
            (&mut high[0], &low[load.slot()])
        };

        let save = save_slot
            .as_mut()
            .unwrap_or_else(|| panic!("process slot {save} is free"));
        let load = load_slot
            .as_ref()
            .unwrap_or_else(|| panic!("process slot {load} is free"));

        (Some(&mut save.context), &load.context)
    }
}

impl<H: Hardware> Index<Pid> for Table<H> {
    type Output = Process<H>;

    fn index(
        &self,
        pid: Pid,
    ) -> &Self::Output {
        self.get(pid).unwrap_or_else(|| panic!("process slot {pid} is free"))
    }
}

impl<H: Hardware> IndexMut<Pid> for Table<H> {
    fn index_mut(
        &mut self,
        pid: Pid,
    ) -> &mut Self::Output {
        self.table[pid.slot()]
            .as_mut()
            .unwrap_or_else(|| panic!("process slot {pid} is free"))
    }
}
