use core::marker::PhantomData;

use static_assertions::assert_eq_size;

use crate::hal::{
    Hardware,
    Level,
};

/// Критическая секция на уровне прерываний.
///
/// - Запоминает уровень прерываний в момент создания.
/// - После чего устанавливает заданный уровень.
/// - Автоматически возвращает исходный уровень в реализации типажа [`Drop`].
pub struct LevelGuard<'a, H: Hardware> {
    /// Аппаратура, уровнем прерываний которой управляет [`LevelGuard`].
    hardware: &'a mut H,

    /// Уровень прерываний до создания [`LevelGuard`].
    previous: Level,
}

impl<'a, H: Hardware> LevelGuard<'a, H> {
    /// Устанавливает уровень прерываний `level`, запоминая предыдущий.
    pub fn new(
        hardware: &'a mut H,
        level: Level,
    ) -> Self {
        let previous = hardware.set_interrupt_level(level);
        Self { hardware, previous }
    }

    /// Уровень прерываний, который будет восстановлен.
    pub fn previous(&self) -> Level {
        self.previous
    }

    /// Доступ к аппаратуре внутри критической секции.
    pub fn hardware(&mut self) -> &mut H {
        self.hardware
    }

    /// Свидетельство того, что критическая секция активна.
    /// Его требуют все методы, меняющие разделяемое состояние ядра.
    pub fn section(&self) -> Section<'_> {
        Section(PhantomData)
    }
}

impl<H: Hardware> Drop for LevelGuard<'_, H> {
    /// Возвращает уровень прерываний в исходное состояние,
    /// в котором он находился до создания этого [`LevelGuard`].
    fn drop(&mut self) {
        self.hardware.set_interrupt_level(self.previous);
    }
}

/// Свидетельство активной критической секции.
/// Не может пережить [`LevelGuard`], который его выдал.
///
/// Получить его в обход [`LevelGuard::section()`] нельзя:
///
/// ```compile_fail
/// let _section = kernel::sync::test_scaffolding::section();
/// ```
///
/// ```compile_fail
/// let _section = kernel::sync::Section(core::marker::PhantomData);
/// ```
#[derive(Clone, Copy)]
pub struct Section<'a>(PhantomData<&'a ()>);

assert_eq_size!(Section<'static>, ());
