use core::fmt;

/// Системные часы --- монотонный счётчик тиков таймера.
///
/// Продвигается только обработчиком прерывания таймера.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Clock {
    /// Количество тиков таймера с момента загрузки.
    ticks: u64,

    /// Частота прерываний таймера.
    ticks_per_second: u64,
}

impl Clock {
    /// Создаёт часы, которые идут с частотой `ticks_per_second` тиков в секунду.
    pub fn new(ticks_per_second: u64) -> Self {
        Self {
            ticks: 0,
            ticks_per_second,
        }
    }

    /// Количество тиков с момента загрузки.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Частота прерываний таймера.
    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    /// Продвигает часы на один тик и возвращает новое показание.
    pub(crate) fn tick(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    /// Возвращает `true`, если с тика `since` прошло не меньше `seconds` секунд.
    pub fn elapsed(
        &self,
        since: u64,
        seconds: u64,
    ) -> bool {
        self.ticks - since >= seconds.saturating_mul(self.ticks_per_second)
    }
}

impl fmt::Display for Clock {
    fn fmt(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(formatter, "{} ticks @ {} Hz", self.ticks, self.ticks_per_second)
    }
}
