pub mod frame;
pub mod worksheet;

pub use frame::{CsvOptions, Frame};
pub use worksheet::Worksheet;
