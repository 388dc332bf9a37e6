pub mod cache;
pub mod csv_source;
pub mod series_csv;
pub mod stooq;

pub use cache::{ArtifactCache, CacheLookup};
pub use csv_source::CsvFileSource;
pub use stooq::StooqClient;
