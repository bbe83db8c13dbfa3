pub mod types;

pub use types::{
    CityMetric, OverallMetrics, ProductSelection, SaleDocument, SalesMetrics, Trend, TrendBucket,
};
