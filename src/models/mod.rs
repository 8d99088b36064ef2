pub mod banner;
pub mod price;
pub mod signal;

pub use banner::*;
pub use price::*;
pub use signal::*;
