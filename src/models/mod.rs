//! Seams exposed to the adapter

pub mod state_updater;
