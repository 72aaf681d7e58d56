//! WA Mirror Server
//!
//! Receives WhatsApp Business webhooks, keeps a normalized copy of every
//! conversation and pushes changes to connected clients in real time.

pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod store;
pub mod webhooks;
pub mod ws;
