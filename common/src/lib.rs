pub mod aggregate;
pub mod config;
pub mod record;
pub mod table;
pub mod util;
pub mod walk;

/// fio reports bandwidth in KiB/s
pub const KIB_PER_GIB: f64 = 1024.0 * 1024.0;
pub const NS_PER_US: f64 = 1000.0;
