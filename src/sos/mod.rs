pub mod controller;

pub use controller::{SosController, SosEvent, SosPhase};
