pub mod time;

pub use time::Timestamp;
