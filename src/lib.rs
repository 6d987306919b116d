// Library for tests to access modules

pub mod batch;
pub mod cli;
pub mod collector;
pub mod config;
pub mod gateway;
pub mod models;
pub mod nqn;
pub mod stats;
pub mod version;
