// Simulation Module
// Multi-venue tick loop (batch and continuous) and run reporting

pub mod controller;
pub mod report;

pub use controller::{SimulationController, SimulationState};
pub use report::{
    AggregateReport, LiveSnapshot, SimulationReport, TerminationReason, VenueReport, VenueSnapshot,
};
