//! Application services - Use case implementations

mod turn_controller;

pub use turn_controller::{
    Readiness, TurnController, TurnControllerConfig, TurnRequest, TurnResponse,
};
