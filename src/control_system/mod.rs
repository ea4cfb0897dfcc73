// control_system/mod.rs
pub mod signal_head;
pub mod traffic_light_controller;
