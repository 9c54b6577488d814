//! Database layer: schema management and per-table operations

pub mod attendance;
pub mod courses;
pub mod cycles;
pub mod init;
pub mod students;

pub use init::init_database;
