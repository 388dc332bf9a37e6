pub mod threshold;

pub use threshold::ThresholdPolicy;
