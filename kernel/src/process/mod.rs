/// Содержит структуру пользовательского процесса [`Process`] и
/// причины его блокировки [`Wait`].
#[allow(clippy::module_inception)]
mod process;

/// Очереди готовых и заблокированных процессов.
mod queue;

/// Планировщик процессов.
/// Реализует простейшее
/// [циклическое исполнение процессов](https://en.wikipedia.org/wiki/Round-robin_scheduling).
mod scheduler;

/// Реализует системные вызовы.
pub(crate) mod syscall;

/// Таблица процессов.
mod table;

use heapless::String;

use ku::process::MAX_PROGRAM_NAME;

use crate::{
    Kernel,
    error::{
        Error::{
            ImageLoad,
            InvalidArgument,
        },
        Result,
    },
    hal::{
        Hardware,
        Level,
    },
    log::{
        info,
        warn,
    },
    sync::LevelGuard,
};

pub use ku::process::{
    Pid,
    State,
};

pub use process::{
    Process,
    Wait,
};
pub use queue::{
    Queue,
    Queues,
};
pub use scheduler::Scheduler;
pub use table::Table;

// Used in docs.
#[allow(unused)]
use crate::error::Error;

/// Итог обработки системного вызова.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// Системный вызов выполнен, результат нужно вернуть процессу.
    Done(usize),

    /// Процесс заблокирован, его причина блокировки [`Wait`] записана в [`Process`].
    /// Процессор нужно отдать другому процессу.
    Blocked,

    /// Процесс завершён, результат возвращать некому.
    Gone,
}

impl<H: Hardware> Kernel<H> {
    /// Создаёт процесс из программы `program` и ставит его в конец очереди готовых процессов.
    /// Никогда не блокирует вызывающего.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::NoProcessSlot`] если в таблице процессов нет свободного слота.
    ///   - [`Error::ImageLoad`] если программу не удалось загрузить.
    ///     Слот таблицы процессов при этом остаётся свободным.
    ///   - [`Error::InvalidArgument`] если имя программы длиннее [`MAX_PROGRAM_NAME`].
    pub fn create_process(
        &mut self,
        program: &str,
    ) -> Result<Pid> {
        let pid = self.shared.scheduler.table().find_free()?;

        let mut name = String::<MAX_PROGRAM_NAME>::new();
        name.push_str(program).map_err(|_| InvalidArgument)?;

        let Some((image, entry)) = self.hardware.load_image(program) else {
            warn!(program, "failed to load the program image");
            return Err(ImageLoad);
        };

        let stack_size = self.config.stack_size;
        let stack = self.hardware.allocate_stack(stack_size);
        let context = self.hardware.initial_context(&image, &stack, stack_size, entry);

        let process = Process::new(
            name,
            context,
            image,
            stack,
            self.config.mutexes_per_process,
        );

        {
            let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
            self.shared.scheduler.admit(pid, process, guard.section());
        }

        info!(%pid, program, entry, "create process");

        Ok(pid)
    }

    /// Завершает исполняющийся процесс `pid`:
    ///   - закрывает все его мьютексы;
    ///   - освобождает образ памяти;
    ///   - передаёт процессор следующему готовому процессу;
    ///   - и только после этого освобождает стек и слот таблицы процессов.
    pub(crate) fn terminate(
        &mut self,
        pid: Pid,
    ) {
        {
            let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
            self.shared.close_all_mutexes(pid, guard.section());
        }

        if let Some(image) = self.shared.scheduler.table_mut()[pid].image.take() {
            self.hardware.release_image(image);
        }

        let times = {
            let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
            self.shared.scheduler.retire(pid, guard.section());
            self.shared.scheduler.table()[pid].times()
        };

        info!(%pid, user = times.user, system = times.system, "terminate");

        self.switch_to_next(None);

        let process = self.shared.scheduler.table_mut().free(pid);
        if let Some(stack) = process.stack {
            self.hardware.release_stack(stack);
        }

        self.resume_current();
    }
}
