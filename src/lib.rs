//! Weekly COVID-19 dashboard for European countries.
//!
//! The weekly table is loaded once ([`data::loader`]), projected per chart
//! ([`data::aggregate`]), turned into declarative chart descriptions
//! ([`chart`]) and published to a display surface by the
//! [`controller::InteractionController`].

pub mod chart;
pub mod color;
pub mod config;
pub mod controller;
pub mod data;
pub mod export;
pub mod geo;
pub mod state;
