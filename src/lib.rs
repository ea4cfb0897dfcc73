//! Timed controller for a four-approach intersection.
//!
//! [`IntersectionController`] drives the north-south and east-west pairs of
//! signal heads through green, yellow and red, never letting both pairs show
//! a non-red phase at once. It runs either from manual commands or from a
//! repeating automatic cycle on a Tokio runtime.

pub mod command;
pub mod config;
pub mod control_system;
pub mod error;
pub mod global_variables;
pub mod shared_data;

pub use config::ControllerConfig;
pub use control_system::signal_head::{Direction, HeadId, Phase, SignalDisplay, SignalHead};
pub use control_system::traffic_light_controller::IntersectionController;
pub use error::{ControllerError, Result};
