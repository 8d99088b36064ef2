pub mod api;
pub mod cache;
pub mod catalog;
pub mod history;
pub mod matcher;
pub mod run;

pub use run::{run, PriceArgs};
