pub mod config;
pub mod evaluation;
pub mod geometry;
pub mod layout;
pub mod layout_dump;
pub mod metrics;
pub mod poi;
pub mod text_metrics;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{Config, load_config};
pub use evaluation::{StrategyReport, TimedLayout, compare_strategies, timed_layout};
pub use geometry::{GeoPoint, Rect};
pub use layout::{LayoutError, LayoutRequest, PackError, Placement, Strategy, layout, layout_blocking};
pub use metrics::{Metrics, compute_metrics};
pub use poi::Point;
pub use text_metrics::{FontMeasurer, HeuristicMeasurer, TextExtent, TextMeasure};

#[cfg(feature = "cli")]
pub use cli::run;
