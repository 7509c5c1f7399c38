pub mod info;
pub mod init;
pub mod score;
pub mod validate;
