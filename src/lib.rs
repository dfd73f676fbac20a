pub mod db;
pub mod server;
pub mod services;
pub mod web;
