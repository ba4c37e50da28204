use core::str;

use ku::{
    MutexKind,
    MutexName,
    process::{
        MAX_MUTEX_NAME,
        MAX_PROGRAM_NAME,
        ResultCode,
        Syscall,
    },
};

use crate::{
    Kernel,
    error::{
        Error::{
            DescriptorTableFull,
            InvalidArgument,
            InvalidSyscall,
            NameTooLong,
            NoMutex,
            NoPage,
        },
        Result,
    },
    hal::{
        FIRST_ARGUMENT_REGISTER,
        Hardware,
        Level,
        RESULT_REGISTER,
        Trap,
    },
    log::{
        debug,
        info,
        trace,
        warn,
    },
    sync::LevelGuard,
};

use super::{
    Pid,
    Step,
    Wait,
};

// Used in docs.
#[allow(unused)]
use crate::error::Error;

/// Размер промежуточного буфера, через который `write()` копирует данные на консоль.
const WRITE_CHUNK: usize = 64;

impl<H: Hardware> Kernel<H> {
    // ANCHOR: syscall
    /// Выполняет диспетчеризацию системного вызова исполняющегося процесса.
    ///
    /// Номер системного вызова процесс передаёт в регистре [`RESULT_REGISTER`],
    /// аргументы --- в регистрах начиная с [`FIRST_ARGUMENT_REGISTER`].
    /// Результат записывается обратно в [`RESULT_REGISTER`].
    /// Неизвестный номер приводит к ошибке [`Error::InvalidSyscall`] без каких-либо
    /// побочных эффектов.
    pub(crate) fn syscall(&mut self) {
        // ANCHOR_END: syscall
        let Some(pid) = self.shared.scheduler.current() else {
            self.hardware.fatal("system call without a current process");
        };

        let number = self.hardware.read_register(RESULT_REGISTER);
        let arg0 = self.argument(0);
        let arg1 = self.argument(1);

        let result = match Syscall::try_from(number) {
            Ok(syscall) => {
                trace!(%pid, ?syscall, arg0, arg1, "syscall");
                self.serve(pid, syscall, arg0, arg1)
            },
            Err(_) => {
                warn!(%pid, number, arg0, arg1, "unknown syscall");
                Err(InvalidSyscall)
            },
        };

        self.complete(pid, result);
    }

    /// Выполняет системный вызов `syscall` процесса `pid` с аргументами `arg0` и `arg1`.
    fn serve(
        &mut self,
        pid: Pid,
        syscall: Syscall,
        arg0: usize,
        arg1: usize,
    ) -> Result<Step> {
        match syscall {
            Syscall::CreateProcess => self.spawn(arg0),
            Syscall::Exit => {
                info!(%pid, "syscall = \"exit\"");
                self.terminate(pid);
                Ok(Step::Gone)
            },
            Syscall::Write => self.write(arg0, arg1),
            Syscall::GetPid => Ok(Step::Done(pid.into_usize())),
            Syscall::Sleep => self.sleep(pid, arg0),
            Syscall::Times => self.times(pid, arg0),
            Syscall::CreateMutex => self.create_mutex(pid, arg0, arg1),
            Syscall::OpenMutex => self.open_mutex(pid, arg0),
            Syscall::Lock => {
                let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
                self.shared.lock(pid, arg0, guard.section())
            },
            Syscall::Unlock => {
                let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
                self.shared.unlock(pid, arg0, guard.section())?;
                Ok(Step::Done(0))
            },
            Syscall::CloseMutex => {
                let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
                self.shared.close_mutex(pid, arg0, guard.section())?;
                Ok(Step::Done(0))
            },
            Syscall::ReadChar => self.read_char(pid),
        }
    }

    /// Доводит до конца системный вызов процесса `pid`,
    /// на котором тот был заблокирован по причине `wait`.
    pub(crate) fn resume(
        &mut self,
        pid: Pid,
        wait: Wait,
    ) -> Result<Step> {
        match wait {
            Wait::Sleep { .. } => Ok(Step::Done(0)),
            Wait::Input => self.read_char(pid),
            Wait::MutexSlot { name, kind } => {
                let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
                self.shared.create_mutex(pid, name, kind, guard.section())
            },
            Wait::Mutex { descriptor, mutex } => {
                let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
                self.shared.relock(pid, descriptor, mutex, guard.section())
            },
        }
    }

    /// Передаёт исполняющемуся процессу `pid` результат системного вызова `result`.
    ///
    /// Если системный вызов заблокировал процесс, отдаёт процессор следующему процессу.
    /// Если при доступе к памяти процесса по переданному им адресу
    /// случилось исключение, оно обрабатывается как [`Trap::MemoryException`]
    /// под флагом доступа к памяти процесса, и процесс завершается.
    pub(crate) fn complete(
        &mut self,
        pid: Pid,
        result: Result<Step>,
    ) {
        match result {
            Ok(Step::Done(value)) => self.hardware.write_register(RESULT_REGISTER, value),
            Ok(Step::Blocked) => {
                self.switch_to_next(Some(pid));
                self.resume_current();
            },
            Ok(Step::Gone) => {},
            Err(NoPage) => {
                warn!(%pid, "memory exception while accessing the system call arguments");
                self.handle(Trap::MemoryException);
            },
            Err(error) => {
                debug!(%pid, %error, "syscall failed");
                self.hardware.write_register(RESULT_REGISTER, ResultCode::encode(Err(error)));
            },
        }
    }

    /// Аргумент системного вызова номер `index`.
    fn argument(
        &self,
        index: usize,
    ) -> usize {
        self.hardware.read_register(FIRST_ARGUMENT_REGISTER + index)
    }

    /// Выполняет `access` к памяти исполняющегося процесса, выставив на это время
    /// флаг доступа к памяти процесса.
    /// Исключение при обращении к памяти под этим флагом не останавливает систему,
    /// а завершает процесс.
    ///
    /// При [`Error::NoPage`] флаг остаётся выставленным до обработки
    /// исключения доступа к памяти в [`Kernel::complete()`].
    fn user_access<T>(
        &mut self,
        access: impl FnOnce(&mut H) -> Result<T>,
    ) -> Result<T> {
        self.set_user_access(true);
        let result = access(&mut self.hardware);

        if result.as_ref().err() != Some(&NoPage) {
            self.set_user_access(false);
        }

        result
    }

    /// Устанавливает флаг доступа к памяти процесса.
    fn set_user_access(
        &mut self,
        value: bool,
    ) {
        let _guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
        self.shared.user_access = value;
    }

    /// Читает из памяти процесса имя мьютекса, завершённое нулём.
    ///
    /// Возвращает ошибки:
    ///   - [`Error::NameTooLong`] если имя длиннее [`MAX_MUTEX_NAME`].
    ///   - [`Error::InvalidArgument`] если имя пусто или не является UTF-8.
    ///   - [`Error::NoPage`] если при чтении случилось исключение.
    fn read_mutex_name(
        &mut self,
        address: usize,
    ) -> Result<MutexName> {
        let mut buffer = [0; MAX_MUTEX_NAME + 1];
        let len =
            self.user_access(|hardware| hardware.copy_string_from_user(address, &mut buffer))?;

        if len > MAX_MUTEX_NAME {
            return Err(NameTooLong);
        }

        MutexName::from_bytes(&buffer[.. len])
    }

    /// Выполняет системный вызов `create_process(program)`.
    /// Возвращает идентификатор созданного процесса.
    fn spawn(
        &mut self,
        address: usize,
    ) -> Result<Step> {
        let mut buffer = [0; MAX_PROGRAM_NAME + 1];
        let len =
            self.user_access(|hardware| hardware.copy_string_from_user(address, &mut buffer))?;

        if len == 0 || len > MAX_PROGRAM_NAME {
            return Err(InvalidArgument);
        }

        let program = str::from_utf8(&buffer[.. len]).map_err(|_| InvalidArgument)?;
        let pid = self.create_process(program)?;

        Ok(Step::Done(pid.into_usize()))
    }

    /// Выполняет системный вызов `write(buffer, len)` ---
    /// выводит на консоль `len` байт из памяти процесса начиная с адреса `buffer`.
    fn write(
        &mut self,
        mut address: usize,
        len: usize,
    ) -> Result<Step> {
        address.checked_add(len).ok_or(InvalidArgument)?;

        let mut chunk = [0; WRITE_CHUNK];
        let mut left = len;

        while left > 0 {
            let size = left.min(WRITE_CHUNK);
            let chunk = &mut chunk[.. size];

            self.user_access(|hardware| hardware.copy_from_user(address, &mut *chunk))?;
            self.hardware.write_console(chunk);

            address += size;
            left -= size;
        }

        Ok(Step::Done(0))
    }

    /// Выполняет системный вызов `sleep(seconds)`.
    /// Процесс блокируется как минимум на `seconds` секунд.
    fn sleep(
        &mut self,
        pid: Pid,
        seconds: usize,
    ) -> Result<Step> {
        let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);

        let wait = Wait::Sleep {
            since: self.shared.clock.ticks(),
            seconds: seconds as u64,
        };
        self.shared.scheduler.park(pid, wait, guard.section());

        Ok(Step::Blocked)
    }

    /// Выполняет системный вызов `times(times)`.
    ///
    /// Если адрес `address` не нулевой, записывает по нему потраченное процессом время [`ku::Times`].
    /// Возвращает количество тиков таймера с момента загрузки.
    fn times(
        &mut self,
        pid: Pid,
        address: usize,
    ) -> Result<Step> {
        if address != 0 {
            let times = self.shared.scheduler.table()[pid].times().to_bytes();
            self.user_access(|hardware| hardware.copy_to_user(address, &times))?;
        }

        Ok(Step::Done(self.shared.clock.ticks() as usize))
    }

    /// Выполняет системный вызов `create_mutex(name, kind)`.
    /// Возвращает дескриптор созданного мьютекса.
    fn create_mutex(
        &mut self,
        pid: Pid,
        address: usize,
        kind: usize,
    ) -> Result<Step> {
        if self.shared.scheduler.table()[pid].descriptors().is_full() {
            return Err(DescriptorTableFull);
        }

        let name = self.read_mutex_name(address)?;
        let kind = MutexKind::try_from(kind).map_err(|_| InvalidArgument)?;

        let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
        self.shared.create_mutex(pid, name, kind, guard.section())
    }

    /// Выполняет системный вызов `open_mutex(name)`.
    /// Возвращает дескриптор открытого мьютекса.
    fn open_mutex(
        &mut self,
        pid: Pid,
        address: usize,
    ) -> Result<Step> {
        if self.shared.scheduler.table()[pid].descriptors().is_full() {
            return Err(DescriptorTableFull);
        }

        let name = self.read_mutex_name(address).map_err(|error| match error {
            NameTooLong => NoMutex,
            error => error,
        })?;

        let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
        let descriptor = self.shared.open_mutex(pid, &name, guard.section())?;

        Ok(Step::Done(descriptor))
    }

    /// Выполняет системный вызов `read_char()`.
    /// Возвращает самый старый символ из буфера ввода терминала,
    /// если буфер пуст --- блокирует процесс до прихода символа.
    fn read_char(
        &mut self,
        pid: Pid,
    ) -> Result<Step> {
        let mut terminal_guard = LevelGuard::new(&mut self.hardware, Level::NoTerminal);

        if let Some(character) = self.shared.terminal.pop(terminal_guard.section()) {
            return Ok(Step::Done(character.into()));
        }

        let guard = LevelGuard::new(terminal_guard.hardware(), Level::NoDevices);
        self.shared.scheduler.park(pid, Wait::Input, guard.section());

        Ok(Step::Blocked)
    }
}
