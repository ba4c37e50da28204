#![allow(dead_code)]

use std::collections::VecDeque;

use kernel::{
    Config,
    Kernel,
    error::{
        Error::NoPage,
        Result,
    },
    hal::{
        FIRST_ARGUMENT_REGISTER,
        Hardware,
        Level,
        RESULT_REGISTER,
        Trap,
    },
    log::debug,
    process::Pid,
};
use ku::{
    ResultCode,
    Syscall,
    Times,
    process::TERMINAL_PORT,
};

use crate::log;

/// Количество регистров симулируемого процессора.
pub const REGISTERS: usize = 4;

/// Размер плоской памяти процессов.
pub const MEMORY_SIZE: usize = 64 * 1024;

/// Сколько раз подряд процессор может простаивать, прежде чем тест сочтёт систему зависшей.
pub const IDLE_LIMIT: usize = 100_000;

/// Адрес, с которого [`Sim::string()`] раскладывает строки в памяти процессов.
const STRINGS: usize = 0x100;

/// Адрес, по которому `times()` записывает [`Times`].
pub const TIMES_ADDRESS: usize = 0x80;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Context {
    pub id: usize,
    pub program: String,
    pub entry: usize,
    pub registers: [usize; REGISTERS],
}

#[derive(Debug)]
pub struct Image {
    pub id: usize,
    pub program: String,
}

#[derive(Debug)]
pub struct Stack {
    pub id: usize,
    pub size: usize,
}

/// Событие, которое [`Machine::halt()`] доставит простаивающему ядру.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    Tick,
    Key(u8),
}

/// Запись в журнале операций симулятора.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Op {
    Switch { save: bool, to: String },
    ReleaseImage(String),
    ReleaseStack(usize),
}

/// Симулятор аппаратуры для ядра.
///
/// Память всех процессов общая и плоская, нулевой адрес и адреса за её пределами
/// вызывают исключение доступа к памяти.
#[derive(Debug)]
pub struct Machine {
    pub level: Level,
    pub installed: Vec<Trap>,
    pub interrupt_controller: bool,
    pub clock: Option<u64>,
    pub keyboard: bool,

    pub live: Context,
    pub user_mode: bool,
    pub software_pending: bool,

    pub events: VecDeque<Event>,
    pub idle: usize,
    pub port: u8,

    pub programs: Vec<String>,
    pub next_id: usize,
    pub images: usize,
    pub stacks: usize,
    pub ops: Vec<Op>,

    pub memory: Vec<u8>,
    pub faults: usize,
    pub console: Vec<u8>,
}

impl Machine {
    pub fn new(programs: &[&str]) -> Self {
        Self {
            level: Level::Open,
            installed: Vec::new(),
            interrupt_controller: false,
            clock: None,
            keyboard: false,

            live: Context::default(),
            user_mode: false,
            software_pending: false,

            events: VecDeque::new(),
            idle: 0,
            port: 0,

            programs: programs.iter().map(|program| program.to_string()).collect(),
            next_id: 1,
            images: 0,
            stacks: 0,
            ops: Vec::new(),

            memory: vec![0; MEMORY_SIZE],
            faults: 0,
            console: Vec::new(),
        }
    }

    pub fn switches(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Switch { to, .. } => Some(to.clone()),
                _ => None,
            })
            .collect()
    }

    /// Проверяет, что ядро может обратиться к `len` байтам памяти процессов
    /// начиная с адреса `address`.
    /// Иначе исключение доступа к памяти случается в режиме ядра.
    fn check(
        &mut self,
        address: usize,
        len: usize,
    ) -> Result<()> {
        match address.checked_add(len) {
            Some(end) if address != 0 && end <= self.memory.len() => Ok(()),
            _ => {
                self.user_mode = false;
                self.faults += 1;
                Err(NoPage)
            },
        }
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Hardware for Machine {
    type Context = Context;
    type Image = Image;
    type Stack = Stack;

    fn install_handler(
        &mut self,
        trap: Trap,
    ) {
        self.installed.push(trap);
    }

    fn init_interrupt_controller(&mut self) {
        self.interrupt_controller = true;
    }

    fn init_clock(
        &mut self,
        ticks_per_second: u64,
    ) {
        self.clock = Some(ticks_per_second);
    }

    fn init_keyboard(&mut self) {
        self.keyboard = true;
    }

    fn set_interrupt_level(
        &mut self,
        level: Level,
    ) -> Level {
        std::mem::replace(&mut self.level, level)
    }

    fn halt(&mut self) -> Trap {
        assert_eq!(self.level, Level::Open, "halt with masked interrupts");

        self.user_mode = false;

        if self.software_pending {
            self.software_pending = false;
            return Trap::Software;
        }

        match self.events.pop_front() {
            Some(Event::Key(character)) => {
                self.port = character;
                Trap::Terminal
            },
            Some(Event::Tick) => Trap::Clock,
            None => {
                self.idle += 1;
                assert!(self.idle < IDLE_LIMIT, "the system idles forever");
                Trap::Clock
            },
        }
    }

    fn from_user_mode(&self) -> bool {
        self.user_mode
    }

    fn raise_software_interrupt(&mut self) {
        self.software_pending = true;
    }

    fn load_image(
        &mut self,
        program: &str,
    ) -> Option<(Image, usize)> {
        if !self.programs.iter().any(|known| known == program) {
            return None;
        }

        let id = self.allocate_id();
        self.images += 1;

        let image = Image {
            id,
            program: program.to_string(),
        };

        Some((image, 0x1000 * id))
    }

    fn release_image(
        &mut self,
        image: Image,
    ) {
        self.images -= 1;
        self.ops.push(Op::ReleaseImage(image.program));
    }

    fn allocate_stack(
        &mut self,
        size: usize,
    ) -> Stack {
        self.stacks += 1;
        Stack {
            id: self.allocate_id(),
            size,
        }
    }

    fn release_stack(
        &mut self,
        stack: Stack,
    ) {
        self.stacks -= 1;
        self.ops.push(Op::ReleaseStack(stack.id));
    }

    fn initial_context(
        &mut self,
        image: &Image,
        stack: &Stack,
        size: usize,
        entry: usize,
    ) -> Context {
        assert_eq!(stack.size, size);

        Context {
            id: image.id,
            program: image.program.clone(),
            entry,
            registers: [0; REGISTERS],
        }
    }

    fn switch_context(
        &mut self,
        save: Option<&mut Context>,
        load: &Context,
    ) {
        let saved = save.is_some();
        if let Some(save) = save {
            *save = self.live.clone();
        }

        self.live = load.clone();
        self.ops.push(Op::Switch {
            save: saved,
            to: load.program.clone(),
        });
    }

    fn read_register(
        &self,
        index: usize,
    ) -> usize {
        self.live.registers[index]
    }

    fn write_register(
        &mut self,
        index: usize,
        value: usize,
    ) {
        self.live.registers[index] = value;
    }

    fn read_port(
        &mut self,
        port: u16,
    ) -> u8 {
        assert_eq!(port, TERMINAL_PORT);
        self.port
    }

    fn copy_from_user(
        &mut self,
        address: usize,
        buffer: &mut [u8],
    ) -> Result<()> {
        self.check(address, buffer.len())?;
        buffer.copy_from_slice(&self.memory[address .. address + buffer.len()]);
        Ok(())
    }

    fn copy_string_from_user(
        &mut self,
        address: usize,
        buffer: &mut [u8],
    ) -> Result<usize> {
        for i in 0 .. buffer.len() {
            self.check(address, i + 1)?;

            let value = self.memory[address + i];
            if value == 0 {
                return Ok(i);
            }
            buffer[i] = value;
        }

        Ok(buffer.len())
    }

    fn copy_to_user(
        &mut self,
        address: usize,
        data: &[u8],
    ) -> Result<()> {
        self.check(address, data.len())?;
        self.memory[address .. address + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn write_console(
        &mut self,
        text: &[u8],
    ) {
        self.console.extend_from_slice(text);
    }

    fn fatal(
        &mut self,
        message: &str,
    ) -> ! {
        panic!("fatal: {message}");
    }
}

/// Ядро на симуляторе и действия процессов над ним.
pub struct Sim {
    pub kernel: Kernel<Machine>,
    strings: usize,
}

impl Sim {
    /// Программы, которые умеет загружать симулятор по умолчанию.
    pub const PROGRAMS: [&'static str; 5] = ["init", "a", "b", "c", "d"];

    pub fn new() -> Self {
        Self::boot(Config::default())
    }

    pub fn boot(config: Config) -> Self {
        Self::boot_with(config, &Self::PROGRAMS)
    }

    pub fn boot_with(
        config: Config,
        programs: &[&str],
    ) -> Self {
        log::init();

        let kernel = Kernel::boot(Machine::new(programs), config);
        assert_eq!(kernel.hardware().level, Level::Open);

        Self {
            kernel,
            strings: STRINGS,
        }
    }

    pub fn machine(&self) -> &Machine {
        self.kernel.hardware()
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        self.kernel.hardware_mut()
    }

    pub fn current(&self) -> Pid {
        self.kernel.current().expect("no current process")
    }

    /// Обрабатывает `trap`, пришедшее из режима пользователя,
    /// и доставляет запрошенное при этом программное прерывание.
    pub fn trap(
        &mut self,
        trap: Trap,
    ) {
        self.machine_mut().user_mode = true;
        self.kernel.handle(trap);
        assert_eq!(self.machine().level, Level::Open);

        if self.machine().software_pending {
            self.machine_mut().software_pending = false;
            self.machine_mut().user_mode = true;
            self.kernel.handle(Trap::Software);
            assert_eq!(self.machine().level, Level::Open);
        }
    }

    pub fn tick(&mut self) {
        self.trap(Trap::Clock);
    }

    pub fn ticks(
        &mut self,
        count: usize,
    ) {
        for _ in 0 .. count {
            self.tick();
        }
    }

    pub fn key(
        &mut self,
        character: u8,
    ) {
        self.machine_mut().port = character;
        self.trap(Trap::Terminal);
    }

    /// Даёт тикам идти, пока процессор не достанется `pid`.
    pub fn run_until(
        &mut self,
        pid: Pid,
    ) {
        for _ in 0 .. IDLE_LIMIT {
            if self.kernel.current() == Some(pid) {
                return;
            }
            self.tick();
        }

        panic!("process {pid} never got the processor");
    }

    /// Исполняющийся процесс делает системный вызов `syscall` с аргументами `args`.
    ///
    /// Возвращает результат, если после вызова исполняется тот же процесс,
    /// и [`None`], если процессор достался другому.
    pub fn syscall(
        &mut self,
        syscall: Syscall,
        args: &[usize],
    ) -> Option<Result<usize>> {
        self.raw_syscall(syscall.into(), args)
    }

    pub fn raw_syscall(
        &mut self,
        number: usize,
        args: &[usize],
    ) -> Option<Result<usize>> {
        let caller = self.machine().live.id;

        debug!(pid = %self.current(), number, ?args, "user syscall");

        let machine = self.machine_mut();
        machine.live.registers[RESULT_REGISTER] = number;
        for (i, arg) in args.iter().enumerate() {
            machine.live.registers[FIRST_ARGUMENT_REGISTER + i] = *arg;
        }

        self.trap(Trap::Syscall);

        (self.machine().live.id == caller).then(|| self.result())
    }

    /// Результат последнего системного вызова исполняющегося процесса.
    pub fn result(&self) -> Result<usize> {
        ResultCode::decode(self.machine().live.registers[RESULT_REGISTER])
    }

    /// Системный вызов, который должен завершиться без переключения процессов.
    pub fn call(
        &mut self,
        syscall: Syscall,
        args: &[usize],
    ) -> Result<usize> {
        self.syscall(syscall, args).expect("the caller lost the processor")
    }

    /// Раскладывает в памяти процессов строку `text`, завершённую нулём.
    pub fn string(
        &mut self,
        text: &str,
    ) -> usize {
        let address = self.strings;
        self.strings += text.len() + 1;

        let memory = &mut self.machine_mut().memory;
        memory[address .. address + text.len()].copy_from_slice(text.as_bytes());
        memory[address + text.len()] = 0;

        address
    }

    pub fn spawn(
        &mut self,
        program: &str,
    ) -> Pid {
        let address = self.string(program);
        let pid = self.call(Syscall::CreateProcess, &[address]).expect("failed to create a process");
        Pid::from_usize(pid).expect("bad pid")
    }

    pub fn create_mutex(
        &mut self,
        name: &str,
        recursive: bool,
    ) -> Option<Result<usize>> {
        let address = self.string(name);
        self.syscall(Syscall::CreateMutex, &[address, recursive.into()])
    }

    pub fn open_mutex(
        &mut self,
        name: &str,
    ) -> Result<usize> {
        let address = self.string(name);
        self.call(Syscall::OpenMutex, &[address])
    }

    pub fn times(&mut self) -> (usize, Times) {
        let ticks = self.call(Syscall::Times, &[TIMES_ADDRESS]).expect("times() failed");

        let mut bytes = [0; Times::SIZE];
        bytes.copy_from_slice(&self.machine().memory[TIMES_ADDRESS .. TIMES_ADDRESS + Times::SIZE]);

        (ticks, Times::from_bytes(&bytes))
    }
}
