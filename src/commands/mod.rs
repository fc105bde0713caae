pub mod init;
pub mod scan;
pub mod watch;
