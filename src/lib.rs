pub mod app;
pub mod config;
pub mod database;
pub mod errors;
pub mod history;
pub mod messages;
pub mod models;
pub mod player;
pub mod prefs;
pub mod providers;
pub mod search;
pub mod skiplist;
pub mod storage;
pub mod youtube;
