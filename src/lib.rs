pub mod board;
pub mod console;
pub mod engine;
pub mod error;
pub mod movegen;
pub mod notation;
pub mod opponent;
