//! Pageforge - API server for a marketing site and page builder
//!
//! Authentication and storage are delegated to Supabase; page markup can be
//! generated by a hosted model and is always sanitized before it is stored or
//! returned.

pub mod api;
pub mod config;
pub mod models;
pub mod services;
