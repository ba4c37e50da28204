use core::{
    fmt,
    ops::Index,
};

use ku::process::TERMINAL_PORT;

use crate::{
    Kernel,
    Shared,
    hal::{
        Hardware,
        Level,
        Trap,
    },
    log::{
        debug,
        error,
        trace,
        warn,
    },
    process::Wait,
    sync::{
        LevelGuard,
        Section,
    },
};

// ANCHOR: statistics
/// Информация о прерывании.
#[derive(Clone, Copy, Debug)]
pub struct Statistics {
    /// Сколько раз сработало это прерывание.
    count: usize,

    /// Короткая мнемоника прерывания.
    mnemonic: &'static str,

    /// Имя прерывания.
    name: &'static str,
}
// ANCHOR_END: statistics

impl Statistics {
    /// Создаёт информацию о прерывании с именем `name` и короткой мнемоникой `mnemonic`.
    const fn new(
        name: &'static str,
        mnemonic: &'static str,
    ) -> Statistics {
        Statistics {
            name,
            mnemonic,
            count: 0,
        }
    }

    /// Сколько раз сработало это прерывание.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Короткая мнемоника прерывания.
    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// Имя прерывания.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Инкрементирует счётчик срабатывания прерывания.
    fn inc(&mut self) {
        self.count += 1;
    }
}

impl fmt::Display for Statistics {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(formatter, "{} ({}): {}", self.name, self.mnemonic, self.count)
    }
}

/// Информация обо всех прерываниях.
#[derive(Clone, Debug)]
pub struct TrapStats([Statistics; Trap::COUNT]);

impl TrapStats {
    /// Возвращает итератор по статистикам прерываний.
    pub fn iter(&self) -> core::slice::Iter<'_, Statistics> {
        self.0.iter()
    }

    /// Учитывает очередное срабатывание `trap`.
    fn register(
        &mut self,
        trap: Trap,
    ) {
        self.0[usize::from(trap)].inc();
    }
}

impl Default for TrapStats {
    fn default() -> Self {
        Self([
            Statistics::new("Arithmetic Exception", "#AE"),
            Statistics::new("Memory Exception", "#ME"),
            Statistics::new("Clock", "#CLK"),
            Statistics::new("Terminal", "#TRM"),
            Statistics::new("System Call", "#SYS"),
            Statistics::new("Software Interrupt", "#SW"),
        ])
    }
}

impl Index<Trap> for TrapStats {
    type Output = Statistics;

    fn index(
        &self,
        index: Trap,
    ) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}

impl<H: Hardware> Kernel<H> {
    // ANCHOR: handle
    /// Обрабатывает исключение или прерывание `trap`.
    ///
    /// Это единственная точка входа в ядро после загрузки ---
    /// [`Hardware::install_handler()`] направляет сюда все шесть видов [`Trap`].
    pub fn handle(
        &mut self,
        trap: Trap,
    ) {
        // ANCHOR_END: handle
        self.trap_stats.register(trap);

        match trap {
            Trap::ArithmeticException | Trap::MemoryException => self.exception(trap),
            Trap::Clock => self.clock_interrupt(),
            Trap::Terminal => self.terminal_interrupt(),
            Trap::Syscall => self.syscall(),
            Trap::Software => self.software_interrupt(),
        }
    }

    /// Обрабатывает арифметическое исключение или исключение доступа к памяти.
    ///
    /// Исключение в коде ядра останавливает систему.
    /// Исключение в коде пользователя, как и исключение доступа к памяти
    /// при чтении аргументов системного вызова, завершает процесс.
    fn exception(
        &mut self,
        trap: Trap,
    ) {
        let user_access = trap == Trap::MemoryException && self.shared.user_access;

        if !self.hardware.from_user_mode() && !user_access {
            error!(?trap, current = ?self.shared.scheduler.current(), "exception in the kernel");
            self.hardware.fatal("exception in the kernel mode");
        }

        let Some(pid) = self.shared.scheduler.current() else {
            self.hardware.fatal("user mode exception without a current process");
        };

        warn!(%pid, ?trap, user_access, "terminating the process");

        if user_access {
            let _guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
            self.shared.user_access = false;
        }

        self.terminate(pid);
    }

    // ANCHOR: clock
    /// Обрабатывает прерывание таймера.
    ///
    /// Учитывает тик в процессорном времени исполняющегося процесса и списывает его
    /// с кванта. На последнем тике кванта запрашивает программное прерывание,
    /// которое переставит процесс в конец очереди готовых.
    /// Будит процессы, которые проспали запрошенное время.
    fn clock_interrupt(&mut self) {
        // ANCHOR_END: clock
        let user_mode = self.hardware.from_user_mode();

        let expired = {
            let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
            self.shared.tick(user_mode, guard.section())
        };

        if expired {
            self.hardware.raise_software_interrupt();
        }
    }

    /// Обрабатывает прерывание терминала.
    fn terminal_interrupt(&mut self) {
        let character = self.hardware.read_port(TERMINAL_PORT);
        let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
        self.shared.receive(character, guard.section());
    }

    /// Обрабатывает программное прерывание.
    ///
    /// Если у исполняющегося процесса истёк квант, переставляет его в конец
    /// очереди готовых и передаёт процессор следующему.
    fn software_interrupt(&mut self) {
        let requeue = self.shared.scheduler.take_requeue();
        let current = self.shared.scheduler.current();

        let Some(pid) = current.filter(|&pid| requeue == Some(pid)) else {
            trace!(?requeue, ?current, "spurious software interrupt");
            return;
        };

        {
            let guard = LevelGuard::new(&mut self.hardware, Level::NoDevices);
            self.shared.scheduler.rotate(pid, guard.section());
        }

        debug!(%pid, "quantum expired");

        self.switch_to_next(Some(pid));
        self.resume_current();
    }
}

impl<H: Hardware> Shared<H> {
    /// Продвигает часы на тик и учитывает его в процессорном времени
    /// исполняющегося процесса.
    /// Тик относится к времени пользователя, если `user_mode` равен `true`.
    ///
    /// Возвращает `true`, если у исполняющегося процесса истёк квант.
    fn tick(
        &mut self,
        user_mode: bool,
        section: Section,
    ) -> bool {
        let ticks = self.clock.tick();
        let mut expired = false;

        if let Some(pid) = self.scheduler.current() {
            let process = &mut self.scheduler.table_mut()[pid];

            if user_mode {
                process.times.user += 1;
            } else {
                process.times.system += 1;
            }

            if process.quantum <= 1 {
                process.quantum = 0;
                self.scheduler.request_requeue(pid);
                expired = true;
            } else {
                process.quantum -= 1;
            }
        }

        let clock = self.clock;
        let woken = self.scheduler.wake_all(
            |wait| match wait {
                Wait::Sleep { since, seconds } => clock.elapsed(*since, *seconds),
                _ => false,
            },
            section,
        );

        if woken > 0 {
            debug!(ticks, woken, "wake sleepers");
        }

        expired
    }

    /// Помещает пришедший с терминала символ `character` в буфер ввода и будит
    /// первый процесс, ждущий ввода.
    /// Если буфер полон, символ отбрасывается.
    fn receive(
        &mut self,
        character: u8,
        section: Section,
    ) {
        if !self.terminal.push(character, section) {
            warn!(character, dropped = self.terminal.dropped(), "terminal buffer is full");
            return;
        }

        if let Some(pid) = self.scheduler.first_blocked(|wait| *wait == Wait::Input) {
            self.scheduler.wake(pid, section);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::hal::Trap;

    use super::TrapStats;

    #[test]
    fn statistics() {
        let mut stats = TrapStats::default();
        stats.register(Trap::Clock);
        stats.register(Trap::Clock);
        stats.register(Trap::Syscall);

        assert_eq!(stats[Trap::Clock].count(), 2);
        assert_eq!(stats[Trap::Syscall].count(), 1);
        assert_eq!(stats[Trap::Terminal].count(), 0);
        assert_eq!(stats[Trap::Software].mnemonic(), "#SW");
        assert_eq!(stats.iter().count(), Trap::ALL.len());

        for trap in Trap::ALL {
            assert!(!stats[trap].name().is_empty());
        }
    }
}
