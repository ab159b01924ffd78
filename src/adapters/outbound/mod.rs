pub mod container;
pub mod storage;
