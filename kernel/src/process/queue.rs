use alloc::vec::Vec;
use core::iter;

use crate::sync::Section;

use super::Pid;

/// Очереди процессов.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Queue {
    /// Процессы, готовые к исполнению.
    /// Голова очереди --- исполняющийся процесс.
    Ready,

    /// Процессы, ждущие события.
    Blocked,
}

impl Queue {
    /// Номер очереди в [`Queues::ends`].
    fn index(self) -> usize {
        match self {
            Queue::Ready => 0,
            Queue::Blocked => 1,
        }
    }
}

/// Звено интрузивного списка, хранящееся для каждого слота таблицы процессов.
#[derive(Clone, Copy, Debug, Default)]
struct Link {
    /// Очередь, в которой сейчас находится процесс.
    queue: Option<Queue>,

    /// Следующий процесс той же очереди.
    next: Option<Pid>,
}

/// Голова и хвост одной очереди.
#[derive(Clone, Copy, Debug, Default)]
struct Ends {
    /// Первый процесс очереди.
    head: Option<Pid>,

    /// Последний процесс очереди.
    tail: Option<Pid>,
}

// ANCHOR: queues
/// Очереди готовых и заблокированных процессов.
///
/// Очереди провязаны индексами слотов таблицы процессов и
/// не владеют процессами.
/// Каждый процесс находится не более чем в одной очереди.
/// Все изменяющие методы требуют свидетельства [`Section`] того,
/// что прерывания, которые тоже меняют очереди, запрещены.
#[derive(Debug)]
pub struct Queues {
    /// Звенья списков, по одному на слот таблицы процессов.
    links: Vec<Link>,

    /// Голова и хвост для каждой очереди [`Queue`].
    ends: [Ends; 2],
}
// ANCHOR_END: queues

impl Queues {
    /// Создаёт пустые очереди для таблицы процессов из `len` слотов.
    pub fn new(len: usize) -> Self {
        Self {
            links: (0 .. len).map(|_| Link::default()).collect(),
            ends: [Ends::default(); 2],
        }
    }

    /// Первый процесс очереди `queue`.
    pub fn head(
        &self,
        queue: Queue,
    ) -> Option<Pid> {
        self.ends[queue.index()].head
    }

    /// Процесс, следующий за `pid` в его очереди.
    pub fn next(
        &self,
        pid: Pid,
    ) -> Option<Pid> {
        self.links[pid.slot()].next
    }

    /// Очередь, в которой находится `pid`.
    pub fn queue_of(
        &self,
        pid: Pid,
    ) -> Option<Queue> {
        self.links[pid.slot()].queue
    }

    /// Возвращает `true`, если очередь `queue` пуста.
    pub fn is_empty(
        &self,
        queue: Queue,
    ) -> bool {
        self.head(queue).is_none()
    }

    /// Итератор по процессам очереди `queue` от головы к хвосту.
    pub fn iter(
        &self,
        queue: Queue,
    ) -> impl Iterator<Item = Pid> + '_ {
        iter::successors(self.head(queue), |pid| self.next(*pid))
    }

    /// Ставит `pid` в хвост очереди `queue`.
    ///
    /// # Panics
    ///
    /// Паникует, если `pid` уже находится в какой-нибудь очереди.
    pub fn push_back(
        &mut self,
        pid: Pid,
        queue: Queue,
        _section: Section,
    ) {
        let link = &mut self.links[pid.slot()];
        assert!(link.queue.is_none(), "process {pid} is already in {:?}", link.queue);

        link.queue = Some(queue);
        link.next = None;

        let ends = &mut self.ends[queue.index()];
        match ends.tail {
            Some(tail) => self.links[tail.slot()].next = Some(pid),
            None => ends.head = Some(pid),
        }
        ends.tail = Some(pid);
    }

    /// Удаляет `pid` из очереди `queue`.
    ///
    /// # Panics
    ///
    /// Паникует, если `pid` не находится в очереди `queue`.
    pub fn remove(
        &mut self,
        pid: Pid,
        queue: Queue,
        _section: Section,
    ) {
        assert_eq!(
            self.links[pid.slot()].queue,
            Some(queue),
            "process {pid} is not in {queue:?}",
        );

        let next = self.links[pid.slot()].next;
        let previous = self.iter(queue).take_while(|&x| x != pid).last();

        match previous {
            Some(previous) => self.links[previous.slot()].next = next,
            None => self.ends[queue.index()].head = next,
        }

        let ends = &mut self.ends[queue.index()];
        if ends.tail == Some(pid) {
            ends.tail = previous;
        }

        self.links[pid.slot()] = Link::default();
    }

    /// Переносит `pid` из очереди `from` в хвост очереди `to`.
    /// Удаление из одной очереди и вставка в другую происходят
    /// в одной и той же критической секции `section`,
    /// поэтому никто не увидит процесс сразу в двух очередях или ни в одной.
    pub fn transfer(
        &mut self,
        pid: Pid,
        from: Queue,
        to: Queue,
        section: Section,
    ) {
        self.remove(pid, from, section);
        self.push_back(pid, to, section);
    }
}
