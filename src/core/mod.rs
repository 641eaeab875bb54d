//! Core recognition modules and shared types.

pub mod bench;
pub mod canvas;
pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod matrix;
pub mod mnist;
pub mod network;
pub mod output;
pub mod trainer;
