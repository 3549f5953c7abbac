//! Variance-stabilising transforms.
//!
//! # Example
//!
//! ```
//! use avocado_forecast::transform::{boxcox, inv_boxcox, LogTransform};
//!
//! let volumes = vec![1200.0, 1500.0, 900.0];
//! let logged = LogTransform::default().forward(&volumes).unwrap();
//! assert_eq!(logged, boxcox(&volumes, 0.0).unwrap());
//! assert!((inv_boxcox(&logged, 0.0)[0] - 1200.0).abs() < 1e-9);
//! ```

pub mod boxcox;
pub mod log;

pub use boxcox::{boxcox, boxcox_lambda, inv_boxcox};
pub use log::LogTransform;
