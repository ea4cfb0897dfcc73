use crate::error::ControllerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Possible states of a signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Green,
    Yellow,
    Red,
}

impl Phase {
    /// The phase that follows this one in the Green -> Yellow -> Red cycle.
    pub fn next(self) -> Self {
        match self {
            Phase::Green => Phase::Yellow,
            Phase::Yellow => Phase::Red,
            Phase::Red => Phase::Green,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Green => "green",
            Phase::Yellow => "yellow",
            Phase::Red => "red",
        };
        f.write_str(name)
    }
}

impl FromStr for Phase {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" | "g" => Ok(Phase::Green),
            "yellow" | "y" | "amber" => Ok(Phase::Yellow),
            "red" | "r" => Ok(Phase::Red),
            _ => Err(ControllerError::InvalidPhase(s.to_string())),
        }
    }
}

/// A pair of opposing approaches that always share one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthSouth,
    EastWest,
}

impl Direction {
    pub fn other(self) -> Self {
        match self {
            Direction::NorthSouth => Direction::EastWest,
            Direction::EastWest => Direction::NorthSouth,
        }
    }

    pub fn heads(self) -> [HeadId; 2] {
        match self {
            Direction::NorthSouth => [HeadId::North, HeadId::South],
            Direction::EastWest => [HeadId::East, HeadId::West],
        }
    }
}

/// Identifies one physical signal head at the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadId {
    North,
    South,
    East,
    West,
}

impl HeadId {
    pub const ALL: [HeadId; 4] = [HeadId::North, HeadId::South, HeadId::East, HeadId::West];

    pub fn direction(self) -> Direction {
        match self {
            HeadId::North | HeadId::South => Direction::NorthSouth,
            HeadId::East | HeadId::West => Direction::EastWest,
        }
    }
}

/// Receives every phase a signal head is told to show.
///
/// Implementations own how a phase becomes a visible indicator. They are
/// called with the controller's lock held and must not call back into it.
pub trait SignalDisplay: Send {
    fn show(&mut self, head: HeadId, phase: Phase);
}

/// Writes every frame to the log.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl SignalDisplay for LogDisplay {
    fn show(&mut self, head: HeadId, phase: Phase) {
        log::info!("Signal head {:?} showing {}", head, phase);
    }
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl SignalDisplay for NullDisplay {
    fn show(&mut self, _head: HeadId, _phase: Phase) {}
}

/// Represents one signal head and the phase it currently displays.
#[derive(Debug, Clone)]
pub struct SignalHead {
    id: HeadId,
    displayed_phase: Phase,
}

impl SignalHead {
    /// Creates a head showing red until the first render.
    pub fn new(id: HeadId) -> Self {
        Self {
            id,
            displayed_phase: Phase::Red,
        }
    }

    /// Records the phase and pushes it to the display. Setting the same
    /// phase twice re-renders without changing anything observable.
    pub fn set_phase(&mut self, phase: Phase, display: &mut dyn SignalDisplay) {
        self.displayed_phase = phase;
        display.show(self.id, phase);
    }

    pub fn phase(&self) -> Phase {
        self.displayed_phase
    }

    pub fn id(&self) -> HeadId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Frames(Vec<(HeadId, Phase)>);

    impl SignalDisplay for Frames {
        fn show(&mut self, head: HeadId, phase: Phase) {
            self.0.push((head, phase));
        }
    }

    #[test]
    fn set_phase_updates_and_renders() {
        let mut frames = Frames::default();
        let mut head = SignalHead::new(HeadId::East);
        assert_eq!(head.phase(), Phase::Red);

        head.set_phase(Phase::Green, &mut frames);
        head.set_phase(Phase::Green, &mut frames);

        assert_eq!(head.phase(), Phase::Green);
        assert_eq!(head.id(), HeadId::East);
        assert_eq!(
            frames.0,
            vec![(HeadId::East, Phase::Green), (HeadId::East, Phase::Green)]
        );
    }

    #[test]
    fn phase_parsing_is_case_insensitive() {
        assert_eq!("GREEN".parse::<Phase>().unwrap(), Phase::Green);
        assert_eq!(" yellow ".parse::<Phase>().unwrap(), Phase::Yellow);
        assert_eq!("r".parse::<Phase>().unwrap(), Phase::Red);
        assert!(matches!(
            "blue".parse::<Phase>(),
            Err(ControllerError::InvalidPhase(ref s)) if s == "blue"
        ));
    }

    #[test]
    fn phase_cycle_wraps() {
        assert_eq!(Phase::Green.next(), Phase::Yellow);
        assert_eq!(Phase::Yellow.next(), Phase::Red);
        assert_eq!(Phase::Red.next(), Phase::Green);
    }

    #[test]
    fn heads_belong_to_their_direction() {
        for direction in [Direction::NorthSouth, Direction::EastWest] {
            for head in direction.heads() {
                assert_eq!(head.direction(), direction);
            }
            assert_ne!(direction.other(), direction);
            assert_eq!(direction.other().other(), direction);
        }
    }
}
