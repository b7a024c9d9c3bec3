//! dayboard
//!
//! Builds a family dashboard screen out of independent data sources
//! (weather, calendars, air quality, a picture of the day, generated
//! blurbs) and renders it to a PNG with a headless browser.
//!
//! Every data source becomes one or more [`Card`]s carrying a deferred
//! loader. [`screen::assemble`] loads them all in parallel, drops the
//! ones that failed or came back empty, and orders the rest by
//! priority, so one unreachable API never takes the screen down.
//!
//! # Example
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> dayboard::Result<()> {
//! let config = dayboard::Config::load(std::path::Path::new("config.yaml"))?;
//!
//! let (header, cards) = dayboard::screen::build_cards(&config, false)?;
//! let (data, error) = dayboard::screen::assemble(header, cards).await;
//! if let Some(error) = error {
//!     eprintln!("some cards failed: {error}");
//! }
//!
//! let png = dayboard::render::screenshot(&data).await?;
//! std::fs::write("screen.png", png)?;
//! # Ok(())
//! # }
//! ```

pub mod airquality;
pub mod calendar;
pub mod card;
pub mod chart;
pub mod config;
pub mod error;
pub mod fake;
pub mod fetch;
pub mod generated;
pub mod header;
pub mod picture;
pub mod render;
pub mod screen;
pub mod weather;

pub use card::{Card, CardContent, CardKind};
pub use chart::{Chart, ChartOptions, HourRange};
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use header::Header;
pub use screen::ScreenData;
