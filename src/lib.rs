pub mod app;
pub mod audio;
pub mod buttons;
pub mod card;
pub mod catalog;
pub mod command;
pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod mode;
pub mod model;
pub mod shuffle;
pub mod web;
