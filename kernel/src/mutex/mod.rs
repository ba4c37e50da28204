/// Таблица дескрипторов мьютексов процесса.
mod descriptor;

/// Глобальная таблица мьютексов.
mod table;

use ku::{
    MutexKind,
    MutexName,
};

use crate::{
    Shared,
    error::{
        Error::{
            DescriptorTableFull,
            DuplicateName,
            NoMutex,
            NotOwner,
        },
        Result,
    },
    hal::Hardware,
    log::{
        debug,
        info,
    },
    process::{
        Pid,
        Step,
        Wait,
    },
    sync::Section,
};

pub use descriptor::Descriptors;
pub use table::{
    Acquire,
    Mutex,
    MutexId,
    MutexTable,
};

// Used in docs.
#[allow(unused)]
use crate::error::Error;

impl<H: Hardware> Shared<H> {
    // ANCHOR: create_mutex
    /// Создаёт мьютекс с именем `name` и типом `kind`, открывает его процессом `pid` и
    /// возвращает дескриптор.
    ///
    /// Если в глобальной таблице мьютексов нет свободного слота, блокирует процесс.
    /// После пробуждения процесс повторяет все проверки заново:
    /// пока он спал, мьютекс с таким же именем мог создать кто-то другой,
    /// а освободившийся слот мог занять другой разбуженный процесс.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::DescriptorTableFull`] если у процесса нет свободного дескриптора.
    ///   - [`Error::DuplicateName`] если мьютекс с таким именем уже есть.
    pub(crate) fn create_mutex(
        &mut self,
        pid: Pid,
        name: MutexName,
        kind: MutexKind,
        section: Section,
    ) -> Result<Step> {
        // ANCHOR_END: create_mutex
        if self.scheduler.table()[pid].descriptors().is_full() {
            return Err(DescriptorTableFull);
        }

        if self.mutexes.find(&name).is_some() {
            return Err(DuplicateName);
        }

        let Some(id) = self.mutexes.free_slot() else {
            debug!(%pid, %name, "mutex table is full");
            self.scheduler.park(pid, Wait::MutexSlot { name, kind }, section);
            return Ok(Step::Blocked);
        };

        info!(%pid, %name, ?kind, mutex = ?id, "create mutex");

        self.mutexes.occupy(id, name, kind, pid, section);
        let descriptor = self.scheduler.table_mut()[pid].descriptors.allocate(id)?;

        Ok(Step::Done(descriptor))
    }

    /// Открывает процессом `pid` существующий мьютекс с именем `name` и возвращает дескриптор.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::DescriptorTableFull`] если у процесса нет свободного дескриптора.
    ///   - [`Error::NoMutex`] если мьютекса с таким именем нет.
    pub(crate) fn open_mutex(
        &mut self,
        pid: Pid,
        name: &MutexName,
        section: Section,
    ) -> Result<usize> {
        if self.scheduler.table()[pid].descriptors().is_full() {
            return Err(DescriptorTableFull);
        }

        let id = self.mutexes.find(name).ok_or(NoMutex)?;
        let descriptor = self.scheduler.table_mut()[pid].descriptors.allocate(id)?;
        self.mutexes[id].open(pid, section);

        debug!(%pid, %name, descriptor, "open mutex");

        Ok(descriptor)
    }

    /// Закрывает дескриптор `descriptor` процесса `pid`.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::BadDescriptor`] если дескриптор выходит за пределы таблицы.
    ///   - [`Error::NotOpen`] если дескриптор не открыт.
    pub(crate) fn close_mutex(
        &mut self,
        pid: Pid,
        descriptor: usize,
        section: Section,
    ) -> Result<()> {
        let id = self.scheduler.table_mut()[pid].descriptors.release(descriptor)?;
        debug!(%pid, descriptor, mutex = ?id, "close mutex");
        self.detach(pid, id, section);
        Ok(())
    }

    /// Закрывает все дескрипторы мьютексов завершающегося процесса `pid`.
    pub(crate) fn close_all_mutexes(
        &mut self,
        pid: Pid,
        section: Section,
    ) {
        while let Some((descriptor, id)) = self.scheduler.table_mut()[pid].descriptors.pop() {
            debug!(%pid, descriptor, mutex = ?id, "close mutex on exit");
            self.detach(pid, id, section);
        }
    }

    // ANCHOR: lock
    /// Захватывает мьютекс, открытый процессом `pid` под дескриптором `descriptor`.
    ///
    /// Если мьютексом владеет другой процесс, блокирует `pid`.
    /// Ожидающие процессы получают мьютекс в порядке очереди заблокированных процессов.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::BadDescriptor`] и [`Error::NotOpen`] для неоткрытого дескриптора.
    ///   - [`Error::Deadlock`] при повторном захвате нерекурсивного мьютекса его владельцем.
    pub(crate) fn lock(
        &mut self,
        pid: Pid,
        descriptor: usize,
        section: Section,
    ) -> Result<Step> {
        // ANCHOR_END: lock
        let id = self.scheduler.table()[pid].descriptors().get(descriptor)?;

        match self.mutexes[id].try_lock(pid, section)? {
            Acquire::Locked => Ok(Step::Done(0)),
            Acquire::Busy => {
                let wait = Wait::Mutex {
                    descriptor,
                    mutex: id,
                };
                self.scheduler.park(pid, wait, section);
                Ok(Step::Blocked)
            },
        }
    }

    /// Доводит до конца захват мьютекса `id` процессом `pid`, разбуженным после ожидания.
    /// Освобождающий мьютекс процесс передаёт его ожидающему напрямую,
    /// так что обычно `pid` к этому моменту уже владелец.
    pub(crate) fn relock(
        &mut self,
        pid: Pid,
        descriptor: usize,
        id: MutexId,
        section: Section,
    ) -> Result<Step> {
        if self.mutexes[id].owner() == Some(pid) {
            Ok(Step::Done(0))
        } else {
            self.lock(pid, descriptor, section)
        }
    }

    /// Освобождает мьютекс, открытый процессом `pid` под дескриптором `descriptor`.
    /// Когда счётчик захватов обнуляется, мьютекс переходит
    /// первому ожидающему процессу, если такой есть.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::BadDescriptor`] и [`Error::NotOpen`] для неоткрытого дескриптора.
    ///   - [`Error::NotOwner`] если `pid` не владеет мьютексом.
    pub(crate) fn unlock(
        &mut self,
        pid: Pid,
        descriptor: usize,
        section: Section,
    ) -> Result<()> {
        let id = self.scheduler.table()[pid].descriptors().get(descriptor)?;
        let mutex = &mut self.mutexes[id];

        if mutex.owner() != Some(pid) {
            return Err(NotOwner);
        }

        if mutex.unlock(section) {
            self.hand_over(id, section);
        }

        Ok(())
    }

    /// Отвязывает процесс `pid` от мьютекса `id` после закрытия очередного дескриптора.
    ///
    /// Пока у процесса остаются другие дескрипторы этого мьютекса, ничего не делает.
    /// Иначе освобождает мьютекс, если процесс им владел,
    /// и снимает отметку об открытии.
    /// Если мьютекс больше никем не открыт, освобождает его слот и будит
    /// все процессы, ждущие свободного слота.
    fn detach(
        &mut self,
        pid: Pid,
        id: MutexId,
        section: Section,
    ) {
        if self.scheduler.table()[pid].descriptors().contains(id) {
            return;
        }

        if self.mutexes[id].owner() == Some(pid) {
            self.mutexes[id].release(section);
            self.hand_over(id, section);
        }

        if self.mutexes[id].close(pid, section) {
            let mutex = self.mutexes.free(id, section);
            let woken = self
                .scheduler
                .wake_all(|wait| matches!(wait, Wait::MutexSlot { .. }), section);

            info!(%pid, name = %mutex.name(), woken, "free mutex");
        }
    }

    /// Передаёт свободный мьютекс `id` первому ожидающему его процессу и будит того.
    fn hand_over(
        &mut self,
        id: MutexId,
        section: Section,
    ) {
        let next = self
            .scheduler
            .first_blocked(|wait| matches!(wait, Wait::Mutex { mutex, .. } if *mutex == id));

        if let Some(next) = next {
            debug!(%next, mutex = ?id, "hand over mutex");
            self.mutexes[id].grant(next, section);
            self.scheduler.wake(next, section);
        }
    }
}
