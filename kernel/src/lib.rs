//! Ядро minikernel --- учебной операционной системы для одного процессора.
//!
//! Ядро управляет таблицей процессов и их очередями, вытесняющим
//! [циклическим планировщиком](https://en.wikipedia.org/wiki/Round-robin_scheduling),
//! обработкой исключений и прерываний, именованными мьютексами и буфером ввода терминала.
//! Единственный механизм взаимного исключения --- уровень прерываний процессора.
//!
//! Сама аппаратура, или её симулятор, скрыта за типажом [`hal::Hardware`],
//! поэтому ядро можно запускать и тестировать как обычную библиотеку.

#![cfg_attr(not(test), no_std)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(missing_docs)]

extern crate alloc;

/// Параметры ядра [`Config`].
pub mod config;

/// Перечисление для возможных ошибок [`Error`] и соответствующий [`Result`].
pub mod error;

/// Интерфейс аппаратуры, на которой работает ядро.
pub mod hal;

/// Поддержка журналирования макросами библиотеки [`tracing`].
pub mod log;

/// Именованные мьютексы: глобальная таблица мьютексов и
/// таблицы дескрипторов мьютексов процессов.
pub mod mutex;

/// Здесь находится часть работы с процессами, которая происходит только в ядре.
pub mod process;

/// Критические секции на уровне прерываний.
pub mod sync;

/// Буфер ввода терминала.
pub mod terminal;

/// Системные часы.
pub mod time;

/// Обработка исключений и [прерываний](https://en.wikipedia.org/wiki/Interrupt).
pub mod trap;

use alloc::vec::Vec;

use ku::MutexName;

use hal::{
    Hardware,
    Trap,
};
use log::{
    error,
    info,
};
use mutex::MutexTable;
use process::{
    Pid,
    Process,
    Queue,
    Scheduler,
    State,
};
use terminal::Terminal;
use time::Clock;
use trap::TrapStats;

pub use config::Config;

// Used in docs.
#[allow(unused)]
use error::{
    Error,
    Result,
};

/// Состояние ядра, которое меняют и код ядра, исполняющийся от имени процесса,
/// и обработчики прерываний.
///
/// Все его изменения происходят только в критических секциях,
/// что подтверждается свидетельством [`sync::Section`].
pub struct Shared<H: Hardware> {
    /// Планировщик с таблицей и очередями процессов.
    pub(crate) scheduler: Scheduler<H>,

    /// Глобальная таблица мьютексов.
    pub(crate) mutexes: MutexTable,

    /// Буфер ввода терминала.
    pub(crate) terminal: Terminal,

    /// Системные часы.
    pub(crate) clock: Clock,

    /// Ядро читает или пишет память процесса по переданному им адресу.
    /// Исключение доступа к памяти в этот момент завершает процесс,
    /// а не останавливает систему.
    pub(crate) user_access: bool,
}

// ANCHOR: kernel
/// Ядро.
pub struct Kernel<H: Hardware> {
    /// Аппаратура, на которой работает ядро.
    pub(crate) hardware: H,

    /// Параметры ядра.
    pub(crate) config: Config,

    /// Разделяемое с обработчиками прерываний состояние.
    pub(crate) shared: Shared<H>,

    /// Статистика исключений и прерываний.
    pub(crate) trap_stats: TrapStats,
}
// ANCHOR_END: kernel

impl<H: Hardware> Kernel<H> {
    /// Загружает ядро на аппаратуре `hardware` с параметрами `config`:
    ///   - регистрирует обработчики всех исключений и прерываний;
    ///   - инициализирует контроллер прерываний, таймер и клавиатуру;
    ///   - создаёт первый процесс из программы [`Config::init_program`] и
    ///     передаёт ему процессор.
    ///
    /// Некорректные параметры или невозможность создать первый процесс
    /// останавливают систему через [`Hardware::fatal()`].
    #[cold]
    #[inline(never)]
    pub fn boot(
        mut hardware: H,
        config: Config,
    ) -> Self {
        if let Err(error) = config.validate() {
            error!(%error, ?config, "invalid kernel configuration");
            hardware.fatal("invalid kernel configuration");
        }

        for trap in Trap::ALL {
            hardware.install_handler(trap);
        }

        hardware.init_interrupt_controller();
        hardware.init_clock(config.ticks_per_second);
        hardware.init_keyboard();

        let shared = Shared {
            scheduler: Scheduler::new(config.process_slots, config.quantum),
            mutexes: MutexTable::new(config.mutex_count),
            terminal: Terminal::new(config.terminal_buffer_size),
            clock: Clock::new(config.ticks_per_second),
            user_access: false,
        };

        let mut kernel = Self {
            hardware,
            config,
            shared,
            trap_stats: TrapStats::default(),
        };

        info!(config = ?kernel.config, "minikernel booted");

        let init_program = kernel.config.init_program;
        if let Err(error) = kernel.create_process(init_program) {
            error!(%error, program = init_program, "failed to create the first process");
            kernel.hardware.fatal("failed to create the first process");
        }

        kernel.switch_to_next(None);

        kernel
    }

    /// Аппаратура, на которой работает ядро.
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Аппаратура, на которой работает ядро.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Параметры ядра.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Исполняющийся процесс.
    pub fn current(&self) -> Option<Pid> {
        self.shared.scheduler.current()
    }

    /// Процесс `pid`, если его слот в таблице процессов занят.
    pub fn process(
        &self,
        pid: Pid,
    ) -> Option<&Process<H>> {
        self.shared.scheduler.table().get(pid)
    }

    /// Состояние слота `pid` таблицы процессов.
    pub fn state(
        &self,
        pid: Pid,
    ) -> State {
        self.shared.scheduler.table().state(pid)
    }

    /// Снимок очереди `queue` от головы к хвосту.
    pub fn queue(
        &self,
        queue: Queue,
    ) -> Vec<Pid> {
        self.shared.scheduler.queues().iter(queue).collect()
    }

    /// Имена существующих мьютексов.
    pub fn mutex_names(&self) -> Vec<MutexName> {
        self.shared.mutexes.iter().map(|(_, mutex)| mutex.name().clone()).collect()
    }

    /// Глобальная таблица мьютексов.
    pub fn mutexes(&self) -> &MutexTable {
        &self.shared.mutexes
    }

    /// Буфер ввода терминала.
    pub fn terminal(&self) -> &Terminal {
        &self.shared.terminal
    }

    /// Количество тиков таймера с момента загрузки.
    pub fn ticks(&self) -> u64 {
        self.shared.clock.ticks()
    }

    /// Статистика исключений и прерываний.
    pub fn trap_stats(&self) -> &TrapStats {
        &self.trap_stats
    }
}
