/// [Битовая карта](https://en.wikipedia.org/wiki/Free-space_bitmap)
/// процессов фиксированного размера.
mod process_set;

pub use process_set::ProcessSet;
