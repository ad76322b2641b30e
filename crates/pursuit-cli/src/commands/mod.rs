pub mod backup;
pub mod init;
pub mod status;
