pub mod characteristic;
pub mod matrix;
pub mod metric;
pub mod polyfit;
pub mod smoothing;
pub mod tuning;

pub use characteristic::characteristic_frequency;
pub use matrix::{activity_table, ActivityCell, ActivityMatrix};
pub use metric::{ActivityMetric, MetricKind, SampleWindow};
pub use smoothing::{median_filter_3x3, FraProfiles};
pub use tuning::{StrategyKind, TuningEstimate, TuningInput, TuningStrategy};
