use alloc::collections::VecDeque;

use crate::sync::Section;

/// Буфер ввода терминала --- ограниченная очередь символов.
///
/// Символы, пришедшие в заполненный буфер, молча отбрасываются.
#[derive(Debug)]
pub struct Terminal {
    /// Принятые, но ещё не прочитанные символы в порядке прихода.
    buffer: VecDeque<u8>,

    /// Ёмкость буфера.
    capacity: usize,

    /// Количество отброшенных из-за переполнения символов.
    dropped: usize,
}

impl Terminal {
    /// Создаёт пустой буфер на `capacity` символов.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Добавляет символ в конец буфера.
    /// Возвращает `false`, если буфер полон и символ отброшен.
    pub fn push(
        &mut self,
        character: u8,
        _section: Section,
    ) -> bool {
        if self.buffer.len() < self.capacity {
            self.buffer.push_back(character);
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Извлекает самый старый символ.
    pub fn pop(
        &mut self,
        _section: Section,
    ) -> Option<u8> {
        self.buffer.pop_front()
    }

    /// Количество символов в буфере.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Возвращает `true`, если в буфере нет символов.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Ёмкость буфера.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Количество отброшенных из-за переполнения символов.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod test {
    use crate::sync::test_scaffolding::section;

    use super::Terminal;

    #[test]
    fn bounded_fifo() {
        let mut terminal = Terminal::new(3);

        for character in b"abcde" {
            terminal.push(*character, section());
        }

        assert_eq!(terminal.len(), 3);
        assert_eq!(terminal.dropped(), 2);

        assert_eq!(terminal.pop(section()), Some(b'a'));
        assert!(terminal.push(b'f', section()));
        assert_eq!(terminal.pop(section()), Some(b'b'));
        assert_eq!(terminal.pop(section()), Some(b'c'));
        assert_eq!(terminal.pop(section()), Some(b'f'));
        assert_eq!(terminal.pop(section()), None);
        assert!(terminal.is_empty());
    }
}
