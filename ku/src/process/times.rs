use core::mem;

/// Процессорное время, потраченное процессом, в тиках таймера.
///
/// Раскладка в памяти процесса --- два `u64` в родном порядке байт:
/// сначала время в режиме пользователя, потом --- в режиме ядра.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(C)]
pub struct Times {
    /// Тики, на которых процесс исполнял код пользователя.
    pub user: u64,

    /// Тики, на которых процесс исполнял код ядра.
    pub system: u64,
}

impl Times {
    /// Размер структуры в памяти процесса.
    pub const SIZE: usize = mem::size_of::<Times>();

    /// Сериализует структуру для записи в память процесса.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[.. 8].copy_from_slice(&self.user.to_ne_bytes());
        bytes[8 ..].copy_from_slice(&self.system.to_ne_bytes());
        bytes
    }

    /// Десериализует структуру, записанную [`Times::to_bytes()`].
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut user = [0; 8];
        let mut system = [0; 8];
        user.copy_from_slice(&bytes[.. 8]);
        system.copy_from_slice(&bytes[8 ..]);

        Self {
            user: u64::from_ne_bytes(user),
            system: u64::from_ne_bytes(system),
        }
    }
}
