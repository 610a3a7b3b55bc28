//! Core library for catalogo: canonical product model, SQLite store,
//! WooCommerce normalization, sync orchestration, PDF rendering and the
//! in-memory browser-session state.

pub mod db;
pub mod error;
pub mod models;
pub mod pdf;
pub mod sanitize;
pub mod service;
pub mod session;
pub mod woocommerce;
