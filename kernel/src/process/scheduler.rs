use ku::process::State;

use crate::{
    Kernel,
    hal::{
        Hardware,
        Level,
    },
    log::{
        debug,
        info,
        trace,
    },
    sync::{
        LevelGuard,
        Section,
    },
};

use super::{
    Pid,
    Process,
    Step,
    Wait,
    queue::{
        Queue,
        Queues,
    },
    table::Table,
};

/// Планировщик процессов.
/// Реализует простейшее
/// [циклическое исполнение процессов](https://en.wikipedia.org/wiki/Round-robin_scheduling)
/// с фиксированным квантом.
///
/// Исполняется всегда голова очереди готовых процессов,
/// остальные готовые процессы ждут за ней в порядке прихода.
pub struct Scheduler<H: Hardware> {
    /// Таблица процессов.
    table: Table<H>,

    /// Очереди готовых и заблокированных процессов.
    queues: Queues,

    /// Исполняющийся процесс.
    /// Пока процессор простаивает в ожидании прерывания, процесса нет.
    current: Option<Pid>,

    /// Процесс, у которого истёк квант и который нужно переставить в конец очереди,
    /// когда дойдёт до программного прерывания.
    requeue: Option<Pid>,

    /// Длина кванта в тиках таймера.
    quantum: u64,
}

impl<H: Hardware> Scheduler<H> {
    /// Создаёт планировщик для таблицы из `slots` процессов с квантом `quantum` тиков.
    pub(crate) fn new(
        slots: usize,
        quantum: u64,
    ) -> Self {
        Self {
            table: Table::new(slots),
            queues: Queues::new(slots),
            current: None,
            requeue: None,
            quantum,
        }
    }

    /// Таблица процессов.
    pub fn table(&self) -> &Table<H> {
        &self.table
    }

    /// Таблица процессов.
    pub(crate) fn table_mut(&mut self) -> &mut Table<H> {
        &mut self.table
    }

    /// Очереди процессов.
    pub fn queues(&self) -> &Queues {
        &self.queues
    }

    /// Исполняющийся процесс.
    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    /// Помещает новый процесс в слот `pid` и ставит его в конец очереди готовых.
    pub(crate) fn admit(
        &mut self,
        pid: Pid,
        process: Process<H>,
        section: Section,
    ) {
        self.table.occupy(pid, process);
        self.queues.push_back(pid, Queue::Ready, section);
    }

    /// Выбирает голову очереди готовых процессов, не удаляя её из очереди,
    /// и выдаёт ей новый квант.
    fn select(
        &mut self,
        _section: Section,
    ) -> Option<Pid> {
        let pid = self.queues.head(Queue::Ready)?;
        self.table[pid].quantum = self.quantum;
        Some(pid)
    }

    /// Блокирует исполняющийся процесс `pid` по причине `wait`.
    pub(crate) fn park(
        &mut self,
        pid: Pid,
        wait: Wait,
        section: Section,
    ) {
        debug!(%pid, ?wait, "block");

        let process = &mut self.table[pid];
        process.state = State::Blocked;
        process.wait = Some(wait);

        self.queues.transfer(pid, Queue::Ready, Queue::Blocked, section);
    }

    /// Будит заблокированный процесс `pid`.
    /// Причина блокировки остаётся в процессе, чтобы довести
    /// прерванный системный вызов до конца, когда до процесса дойдёт очередь.
    pub(crate) fn wake(
        &mut self,
        pid: Pid,
        section: Section,
    ) {
        let process = &mut self.table[pid];
        debug!(%pid, wait = ?process.wait, "wake");
        process.state = State::Ready;

        self.queues.transfer(pid, Queue::Blocked, Queue::Ready, section);
    }

    /// Первый в очереди заблокированный процесс, причина блокировки которого
    /// удовлетворяет `predicate`.
    pub(crate) fn first_blocked(
        &self,
        mut predicate: impl FnMut(&Wait) -> bool,
    ) -> Option<Pid> {
        self.queues
            .iter(Queue::Blocked)
            .find(|&pid| self.table[pid].wait.as_ref().is_some_and(&mut predicate))
    }

    /// За один проход по очереди заблокированных процессов будит все,
    /// причина блокировки которых удовлетворяет `predicate`.
    /// Возвращает количество разбуженных процессов.
    pub(crate) fn wake_all(
        &mut self,
        mut predicate: impl FnMut(&Wait) -> bool,
        section: Section,
    ) -> usize {
        let mut woken = 0;
        let mut cursor = self.queues.head(Queue::Blocked);

        while let Some(pid) = cursor {
            cursor = self.queues.next(pid);

            if self.table[pid].wait.as_ref().is_some_and(&mut predicate) {
                self.wake(pid, section);
                woken += 1;
            }
        }

        woken
    }

    /// Переставляет исполняющийся процесс `pid` из головы в хвост очереди готовых.
    pub(crate) fn rotate(
        &mut self,
        pid: Pid,
        section: Section,
    ) {
        self.queues.transfer(pid, Queue::Ready, Queue::Ready, section);
    }

    /// Помечает процесс `pid` завершённым и убирает его из очереди готовых.
    pub(crate) fn retire(
        &mut self,
        pid: Pid,
        section: Section,
    ) {
        self.table[pid].state = State::Terminated;
        self.queues.remove(pid, Queue::Ready, section);

        if self.current == Some(pid) {
            self.current = None;
        }
        if self.requeue == Some(pid) {
            self.requeue = None;
        }
    }

    /// Запоминает, что у процесса `pid` истёк квант.
    pub(crate) fn request_requeue(
        &mut self,
        pid: Pid,
    ) {
        self.requeue = Some(pid);
    }

    /// Забирает отметку об истечении кванта.
    pub(crate) fn take_requeue(&mut self) -> Option<Pid> {
        self.requeue.take()
    }
}

impl<H: Hardware> Kernel<H> {
    /// Возвращает процесс, который нужно исполнять следующим, ---
    /// голову очереди готовых процессов.
    ///
    /// Пока готовых процессов нет, понижает уровень прерываний и
    /// останавливает процессор до прихода прерывания, которое тут же обрабатывает.
    /// Никогда не завершается с ошибкой.
    pub(crate) fn pick_next_ready(&mut self) -> Pid {
        loop {
            let next = {
                let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
                self.shared.scheduler.select(guard.section())
            };

            if let Some(pid) = next {
                return pid;
            }

            trace!(ticks = self.shared.clock.ticks(), "idle");

            let trap = {
                let mut guard = LevelGuard::new(&mut self.hardware, Level::Open);
                guard.hardware().halt()
            };

            self.handle(trap);
        }
    }

    /// Снимает с процессора процесс `outgoing` и передаёт процессор
    /// следующему готовому процессу.
    ///
    /// Если `outgoing` равен [`None`], состояние уходящего процесса не сохраняется.
    /// Если следующим выбран сам `outgoing`, переключения не происходит.
    pub(crate) fn switch_to_next(
        &mut self,
        outgoing: Option<Pid>,
    ) {
        self.shared.scheduler.current = None;
        let next = self.pick_next_ready();
        self.shared.scheduler.current = Some(next);

        if outgoing == Some(next) {
            trace!(pid = %next, "keep running");
            return;
        }

        info!(from = ?outgoing, to = %next, "switch");

        let (save, load) = self.shared.scheduler.table.contexts(outgoing, next);
        self.hardware.switch_context(save, load);
    }

    /// Доводит до конца системный вызов, на котором был заблокирован
    /// только что получивший процессор процесс.
    ///
    /// Если системный вызов снова блокирует процесс,
    /// процессор передаётся следующему процессу, и так далее.
    pub(crate) fn resume_current(&mut self) {
        while let Some(pid) = self.shared.scheduler.current {
            let Some(wait) = self.shared.scheduler.table[pid].wait.take() else {
                return;
            };

            trace!(%pid, ?wait, "resume");

            match self.resume(pid, wait) {
                Ok(Step::Blocked) => self.switch_to_next(Some(pid)),
                result => {
                    self.complete(pid, result);
                    return;
                },
            }
        }
    }
}
