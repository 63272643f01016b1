// src/models/mod.rs

pub mod attempt;
pub mod caller;
pub mod id;
pub mod question;
pub mod quiz;
