//! Polite, scope-limited crawler for the UCI ICS, CS, Informatics and
//! Statistics web sites.

pub mod config;
pub mod crawler;
