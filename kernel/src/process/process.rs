use core::fmt;

use heapless::String;

use ku::{
    MutexKind,
    MutexName,
    Times,
    process::{
        MAX_PROGRAM_NAME,
        State,
    },
};

use crate::{
    hal::Hardware,
    mutex::{
        Descriptors,
        MutexId,
    },
};

// ANCHOR: wait
/// Причина, по которой процесс заблокирован.
///
/// После пробуждения процесса причина остаётся в его [`Process`] как продолжение
/// прерванного системного вызова.
/// Когда планировщик в следующий раз выберет процесс,
/// системный вызов будет доведён до конца,
/// а его результат записан в регистры процесса.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Wait {
    /// Процесс спит `seconds` секунд, начиная с тика `since`.
    Sleep {
        /// Тик, на котором процесс заснул.
        since: u64,

        /// Сколько секунд спать.
        seconds: u64,
    },

    /// Процесс ждёт символ в буфере ввода терминала.
    Input,

    /// Процесс ждёт свободный слот в глобальной таблице мьютексов,
    /// чтобы создать мьютекс `name` типа `kind`.
    MutexSlot {
        /// Имя создаваемого мьютекса.
        name: MutexName,

        /// Тип создаваемого мьютекса.
        kind: MutexKind,
    },

    /// Процесс ждёт освобождения мьютекса `mutex`, открытого под дескриптором `descriptor`.
    Mutex {
        /// Дескриптор, по которому процесс захватывает мьютекс.
        descriptor: usize,

        /// Слот глобальной таблицы мьютексов.
        mutex: MutexId,
    },
}
// ANCHOR_END: wait

/// Описывает пользовательский процесс.
pub struct Process<H: Hardware> {
    /// Программа, из которой создан процесс.
    pub(crate) program: String<MAX_PROGRAM_NAME>,

    /// Состояние процесса.
    pub(crate) state: State,

    /// Сохранённый контекст исполнения.
    pub(crate) context: H::Context,

    /// Образ памяти процесса.
    /// Освобождается при завершении процесса ещё до переключения на другой процесс.
    pub(crate) image: Option<H::Image>,

    /// Стек процесса.
    /// Освобождается при завершении процесса только после переключения на другой процесс.
    pub(crate) stack: Option<H::Stack>,

    /// Оставшиеся тики текущего кванта.
    pub(crate) quantum: u64,

    /// Потраченное процессом процессорное время.
    pub(crate) times: Times,

    /// Причина блокировки или незавершённый после пробуждения системный вызов.
    pub(crate) wait: Option<Wait>,

    /// Таблица дескрипторов мьютексов.
    pub(crate) descriptors: Descriptors,
}

impl<H: Hardware> Process<H> {
    /// Создаёт готовый к исполнению процесс.
    pub(super) fn new(
        program: String<MAX_PROGRAM_NAME>,
        context: H::Context,
        image: H::Image,
        stack: H::Stack,
        descriptors: usize,
    ) -> Self {
        Self {
            program,
            state: State::Ready,
            context,
            image: Some(image),
            stack: Some(stack),
            quantum: 0,
            times: Times::default(),
            wait: None,
            descriptors: Descriptors::new(descriptors),
        }
    }

    /// Программа, из которой создан процесс.
    pub fn program(&self) -> &str {
        self.program.as_str()
    }

    /// Состояние процесса.
    pub fn state(&self) -> State {
        self.state
    }

    /// Потраченное процессом процессорное время.
    pub fn times(&self) -> Times {
        self.times
    }

    /// Причина блокировки, если процесс заблокирован или
    /// ещё не закончил прерванный блокировкой системный вызов.
    pub fn wait(&self) -> Option<&Wait> {
        self.wait.as_ref()
    }

    /// Оставшиеся тики текущего кванта.
    pub fn quantum(&self) -> u64 {
        self.quantum
    }

    /// Таблица дескрипторов мьютексов.
    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }
}

impl<H: Hardware> fmt::Display for Process<H> {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(
            formatter,
            "{{ program: {}, state: {:?}, quantum: {}, user: {}, system: {}, wait: {:?}, mutexes: {} }}",
            self.program,
            self.state,
            self.quantum,
            self.times.user,
            self.times.system,
            self.wait,
            self.descriptors.count(),
        )
    }
}
