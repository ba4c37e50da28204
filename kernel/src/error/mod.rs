pub use ku::error::{
    Error,
    Result,
};
