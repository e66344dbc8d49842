pub mod config;
pub mod logging;

pub mod catalog;
pub mod convert;
pub mod download;
pub mod error;
pub mod http;
pub mod naming;
pub mod scripts;
pub mod storage;
pub mod tools;
pub mod verify;
