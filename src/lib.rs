pub mod auth;
pub mod client;
pub mod db_client;
pub mod guard;
pub mod mock;
pub mod models;
pub mod storage;
