use ku::process::{
    MAX_PROCESS_SLOTS,
    MAX_PROGRAM_NAME,
};

use crate::error::{
    Error::InvalidArgument,
    Result,
};

/// Параметры ядра, которые фиксируются при его загрузке.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Количество слотов в таблице процессов.
    pub process_slots: usize,

    /// Частота прерываний таймера.
    pub ticks_per_second: u64,

    /// Квант времени --- количество тиков таймера,
    /// которые процесс исполняется до принудительного переключения.
    pub quantum: u64,

    /// Размер стека процесса в байтах.
    pub stack_size: usize,

    /// Количество слотов в глобальной таблице мьютексов.
    pub mutex_count: usize,

    /// Количество дескрипторов мьютексов у каждого процесса.
    pub mutexes_per_process: usize,

    /// Ёмкость буфера ввода терминала в символах.
    pub terminal_buffer_size: usize,

    /// Программа, из которой создаётся первый процесс.
    pub init_program: &'static str,
}

impl Config {
    /// Проверяет, что с такими параметрами ядро может работать.
    ///
    /// Возвращает ошибку [`crate::error::Error::InvalidArgument`], если
    ///   - какой-нибудь из размеров или частота равны нулю;
    ///   - слотов в таблице процессов больше [`MAX_PROCESS_SLOTS`];
    ///   - имя первой программы пусто или длиннее [`MAX_PROGRAM_NAME`].
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            self.process_slots,
            self.stack_size,
            self.mutex_count,
            self.mutexes_per_process,
            self.terminal_buffer_size,
        ];

        if sizes.contains(&0) || self.ticks_per_second == 0 || self.quantum == 0 {
            return Err(InvalidArgument);
        }

        if self.process_slots > MAX_PROCESS_SLOTS {
            return Err(InvalidArgument);
        }

        if self.init_program.is_empty() || self.init_program.len() > MAX_PROGRAM_NAME {
            return Err(InvalidArgument);
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            process_slots: 10,
            ticks_per_second: 100,
            quantum: 10,
            stack_size: 32 * 1024,
            mutex_count: 16,
            mutexes_per_process: 4,
            terminal_buffer_size: 8,
            init_program: "init",
        }
    }
}
