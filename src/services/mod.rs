pub mod codec;
pub mod storage;
pub mod upload;
