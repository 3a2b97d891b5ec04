//! Route modules for the receipt server

pub mod auth;
pub mod categories;
pub mod items;
pub mod receipts;
