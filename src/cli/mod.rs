pub mod chart;
pub mod dashboard;
pub mod products;
pub mod setup;
pub mod show;
pub mod ui;
