pub mod analyze;
pub mod crawler;
pub mod run;

pub use run::{run, SignalArgs};
