pub mod analyze;
pub mod db;
pub mod init;
pub mod schedule;
pub mod stats;
pub mod worker;
