pub mod service;

pub use service::{decimal_from_f64, AppService};
