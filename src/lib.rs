//! Card recommendations for competitive Commander decks, scored against a
//! corpus of tournament decklists.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
