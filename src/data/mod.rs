//! Sales data: observations, the CSV loader, the regional panel and a
//! synthetic generator with the same shape.

pub mod loader;
pub mod observation;
pub mod panel;
pub mod synthetic;

pub use loader::{load_csv, parse_date, read_csv};
pub use observation::{Observation, ProductType, SeriesKey};
pub use panel::{Panel, WeeklySeries};
pub use synthetic::{generate, write_csv, SyntheticConfig};
