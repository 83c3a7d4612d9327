//! Core scan engine: prompt construction and the deal scanner.

pub mod prompt;
pub mod scanner;
