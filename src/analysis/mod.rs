//! Exploratory analysis of the sales panel.

mod explore;

pub use explore::{
    explore, DatasetSummary, ExploratoryReport, MonthlyProfile, SeriesDiagnostics, TypeSummary,
    YearlyVolume,
};
