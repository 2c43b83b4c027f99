pub mod logging;

pub use logging::clip_for_log;
