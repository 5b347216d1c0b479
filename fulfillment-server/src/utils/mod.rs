pub mod cache;
pub mod logger;
pub mod time;

pub use cache::{Clock, SystemClock, TtlCache};
pub use time::now_ms;
