#![allow(dead_code)]

use intersection_controller::{
    ControllerConfig, Direction, HeadId, IntersectionController, Phase, SignalDisplay,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Tracks what every head shows and counts frames where both pairs are
/// non-red at once.
#[derive(Debug, Default)]
pub struct Recording {
    pub shown: HashMap<HeadId, Phase>,
    pub frames: usize,
    pub unsafe_frames: usize,
}

impl Recording {
    fn pair_is_red(&self, direction: Direction) -> bool {
        direction
            .heads()
            .iter()
            .all(|head| self.shown.get(head).copied().unwrap_or(Phase::Red) == Phase::Red)
    }
}

#[derive(Clone, Default)]
pub struct RecordingDisplay(pub Arc<Mutex<Recording>>);

impl SignalDisplay for RecordingDisplay {
    fn show(&mut self, head: HeadId, phase: Phase) {
        let mut recording = self.0.lock().unwrap();
        recording.shown.insert(head, phase);
        recording.frames += 1;
        if !recording.pair_is_red(Direction::NorthSouth) && !recording.pair_is_red(Direction::EastWest)
        {
            recording.unsafe_frames += 1;
        }
    }
}

pub fn recorded_controller() -> (IntersectionController, Arc<Mutex<Recording>>) {
    let display = RecordingDisplay::default();
    let recording = display.0.clone();
    let controller = IntersectionController::new(ControllerConfig::default(), display).unwrap();
    (controller, recording)
}
