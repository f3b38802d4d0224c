pub mod init;
pub mod mark;
pub mod run;
pub mod status;
