/// Server services
pub mod catalog;
pub mod clock_driver;
pub mod routing;
pub mod status_sink;
pub mod ytdlp;

pub use catalog::CatalogResolver;
pub use clock_driver::{ClockDriver, ClockDriverFactory};
pub use routing::RoutingResolver;
pub use status_sink::RecentStatusSink;
pub use ytdlp::YtDlpResolver;
