use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};

use crate::error::Result;

/// Регистр, в котором процесс передаёт номер системного вызова и
/// получает обратно его результат.
pub const RESULT_REGISTER: usize = 0;

/// Регистр первого аргумента системного вызова,
/// остальные аргументы идут в следующих по номеру регистрах.
pub const FIRST_ARGUMENT_REGISTER: usize = 1;

/// Уровень прерываний --- порог, определяющий какие прерывания
/// могут вытеснить текущее исполнение.
///
/// Это единственный механизм взаимного исключения в ядре.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, Ord, PartialEq, PartialOrd, TryFromPrimitive)]
#[repr(u8)]
pub enum Level {
    /// Разрешены все прерывания.
    /// На этом уровне процессор простаивает в ожидании прерывания.
    Open = 1,

    /// Запрещены прерывания терминала и программные прерывания.
    /// Защищает буфер ввода терминала при чтении из него.
    NoTerminal = 2,

    /// Запрещены прерывания таймера, терминала и программные прерывания.
    /// Защищает очереди процессов и остальное разделяемое состояние ядра.
    NoDevices = 3,
}

/// Исключения и прерывания, которые обрабатывает ядро.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
#[repr(usize)]
pub enum Trap {
    /// Арифметическое исключение, например деление на ноль.
    ArithmeticException = 0,

    /// Исключение при обращении к памяти.
    MemoryException = 1,

    /// Прерывание таймера.
    Clock = 2,

    /// Прерывание терминала --- пришёл очередной символ.
    Terminal = 3,

    /// Системный вызов.
    Syscall = 4,

    /// Программное прерывание, запрошенное самим ядром для перепланирования.
    Software = 5,
}

impl Trap {
    /// Все обрабатываемые ядром исключения и прерывания.
    pub const ALL: [Trap; Trap::COUNT] = [
        Trap::ArithmeticException,
        Trap::MemoryException,
        Trap::Clock,
        Trap::Terminal,
        Trap::Syscall,
        Trap::Software,
    ];

    /// Количество обрабатываемых ядром исключений и прерываний.
    pub const COUNT: usize = Trap::Software as usize + 1;
}

// ANCHOR: hardware
/// Аппаратура или её симулятор, поверх которых работает ядро.
///
/// Ядро никогда не заглядывает внутрь контекста исполнения, образа памяти и стека ---
/// для него это непрозрачные значения, которыми оно только владеет и
/// которые передаёт обратно в методы этого типажа.
pub trait Hardware {
    /// Сохранённое состояние регистров процесса.
    type Context;

    /// Образ памяти процесса, загруженный из исполнимого файла.
    type Image;

    /// Стек процесса для исполнения кода ядра.
    type Stack;

    /// Регистрирует ядро как обработчик `trap`.
    fn install_handler(
        &mut self,
        trap: Trap,
    );

    /// Инициализирует контроллер прерываний.
    fn init_interrupt_controller(&mut self);

    /// Инициализирует таймер с частотой `ticks_per_second` прерываний в секунду.
    fn init_clock(
        &mut self,
        ticks_per_second: u64,
    );

    /// Инициализирует контроллер клавиатуры.
    fn init_keyboard(&mut self);

    /// Устанавливает уровень прерываний `level` и возвращает предыдущий.
    fn set_interrupt_level(
        &mut self,
        level: Level,
    ) -> Level;

    /// Останавливает процессор до прихода прерывания и возвращает пришедшее прерывание.
    /// Обработать его должно само ядро.
    fn halt(&mut self) -> Trap;

    /// Возвращает `true`, если обрабатываемое прерывание пришло из режима пользователя.
    fn from_user_mode(&self) -> bool;

    /// Запрашивает [`Trap::Software`], которое будет доставлено,
    /// когда уровень прерываний это позволит.
    fn raise_software_interrupt(&mut self);

    /// Загружает программу `program` в новый образ памяти.
    /// Возвращает образ и адрес точки входа или [`None`], если загрузить программу не удалось.
    fn load_image(
        &mut self,
        program: &str,
    ) -> Option<(Self::Image, usize)>;

    /// Освобождает образ памяти процесса.
    fn release_image(
        &mut self,
        image: Self::Image,
    );

    /// Выделяет стек размером `size` байт.
    fn allocate_stack(
        &mut self,
        size: usize,
    ) -> Self::Stack;

    /// Освобождает стек.
    fn release_stack(
        &mut self,
        stack: Self::Stack,
    );

    /// Строит начальный контекст процесса, который начнёт исполнение
    /// с адреса `entry` в образе `image` на стеке `stack` размера `size`.
    fn initial_context(
        &mut self,
        image: &Self::Image,
        stack: &Self::Stack,
        size: usize,
        entry: usize,
    ) -> Self::Context;

    /// Сохраняет текущий контекст в `save`, если он задан, и
    /// выбирает `load` контекстом, который продолжит исполнение
    /// после возврата из обрабатываемого прерывания.
    fn switch_context(
        &mut self,
        save: Option<&mut Self::Context>,
        load: &Self::Context,
    );

    /// Читает регистр `index` текущего процесса.
    fn read_register(
        &self,
        index: usize,
    ) -> usize;

    /// Записывает `value` в регистр `index` текущего процесса.
    fn write_register(
        &mut self,
        index: usize,
        value: usize,
    );

    /// Читает байт из порта ввода--вывода `port`.
    fn read_port(
        &mut self,
        port: u16,
    ) -> u8;

    /// Копирует `buffer.len()` байт памяти текущего процесса начиная с адреса `address`.
    ///
    /// Возвращает ошибку [`crate::error::Error::NoPage`],
    /// если при обращении к памяти произошло исключение.
    fn copy_from_user(
        &mut self,
        address: usize,
        buffer: &mut [u8],
    ) -> Result<()>;

    /// Копирует строку, завершённую нулём, из памяти текущего процесса по адресу `address`.
    /// Копирует не больше `buffer.len()` байт и возвращает длину строки без завершающего нуля,
    /// или `buffer.len()`, если ноль в пределах `buffer` не встретился.
    ///
    /// Возвращает ошибку [`crate::error::Error::NoPage`],
    /// если при обращении к памяти произошло исключение.
    fn copy_string_from_user(
        &mut self,
        address: usize,
        buffer: &mut [u8],
    ) -> Result<usize>;

    /// Записывает `data` в память текущего процесса по адресу `address`.
    ///
    /// Возвращает ошибку [`crate::error::Error::NoPage`],
    /// если при обращении к памяти произошло исключение.
    fn copy_to_user(
        &mut self,
        address: usize,
        data: &[u8],
    ) -> Result<()>;

    /// Выводит `text` на консоль.
    fn write_console(
        &mut self,
        text: &[u8],
    );

    /// Останавливает систему с сообщением `message`.
    /// Вызывается только при нарушении инвариантов ядра.
    fn fatal(
        &mut self,
        message: &str,
    ) -> !;
}
// ANCHOR_END: hardware
