// Engine library root

pub mod cache;
pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod models;
pub mod pyramid;
pub mod services;
pub mod storage;
