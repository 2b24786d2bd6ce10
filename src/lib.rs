pub mod astro;
pub mod catalog;
pub mod config;
pub mod mission;
pub mod predict;
pub mod selection;
pub mod tracker;
