pub mod chart;
pub mod dashboard;
pub mod form;
pub mod menu;
pub mod typing_area;
