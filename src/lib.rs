//Rust hates greek characters
#![allow(confusable_idents)]

pub mod algebra;
pub mod ldl;
pub mod solver;
pub mod timers;
