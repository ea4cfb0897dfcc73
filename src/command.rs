use crate::control_system::traffic_light_controller::IntersectionController;
use crate::error::{ControllerError, Result};
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Commands accepted by the admin command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Green,
    Yellow,
    Red,
    Next,
    Auto,
    Stop,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ControllerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" | "g" => Ok(Command::Green),
            "yellow" | "y" => Ok(Command::Yellow),
            "red" | "r" => Ok(Command::Red),
            "next" | "n" => Ok(Command::Next),
            "auto" | "start" => Ok(Command::Auto),
            "stop" | "manual" => Ok(Command::Stop),
            "status" | "s" => Ok(Command::Status),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => Err(ControllerError::UnknownCommand(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Reply(String),
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  green   show green for the active direction
  yellow  show yellow, handing over after the yellow delay
  red     hand over to the other direction
  next    advance one step along green -> yellow -> red
  auto    start (or restart) the automatic cycle
  stop    stop the automatic cycle
  status  print the controller state as JSON
  quit    shut the controller down and exit";

impl Command {
    pub fn apply(self, controller: &IntersectionController) -> Result<CommandOutcome> {
        match self {
            Command::Green => controller.change_to_green(),
            Command::Yellow => controller.change_to_yellow(),
            Command::Red => controller.change_to_red(),
            Command::Next => controller.next_state(),
            Command::Auto => controller.start_auto_mode(),
            Command::Stop => controller.stop_auto_mode(),
            Command::Status => {
                let json = serde_json::to_string_pretty(&controller.get_state())?;
                return Ok(CommandOutcome::Reply(json));
            }
            Command::Help => return Ok(CommandOutcome::Reply(HELP_TEXT.to_string())),
            Command::Quit => {
                controller.shutdown();
                return Ok(CommandOutcome::Quit);
            }
        }
        Ok(CommandOutcome::Reply(format!(
            "{:?} {}",
            controller.active_direction(),
            controller.get_phase()
        )))
    }
}

// Reads one command per line until quit or end of input.
pub async fn run_cli<R>(controller: IntersectionController, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    println!("\nIntersection Controller Admin CLI");
    println!("{}", HELP_TEXT);
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let outcome = line
            .parse::<Command>()
            .and_then(|command| command.apply(&controller));
        match outcome {
            Ok(CommandOutcome::Reply(reply)) => println!("{}", reply),
            Ok(CommandOutcome::Quit) => {
                println!("Exiting CLI.");
                return Ok(());
            }
            Err(e) => eprintln!("{}", e),
        }
    }
    controller.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::control_system::signal_head::{Direction, NullDisplay, Phase};

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!("GREEN".parse::<Command>().unwrap(), Command::Green);
        assert_eq!(" n ".parse::<Command>().unwrap(), Command::Next);
        assert_eq!("start".parse::<Command>().unwrap(), Command::Auto);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
        assert!(matches!(
            "blink".parse::<Command>(),
            Err(ControllerError::UnknownCommand(ref s)) if s == "blink"
        ));
    }

    #[tokio::test]
    async fn status_reply_is_json_snapshot() {
        let controller =
            IntersectionController::new(ControllerConfig::default(), NullDisplay).unwrap();
        let outcome = Command::Status.apply(&controller).unwrap();
        let CommandOutcome::Reply(json) = outcome else {
            panic!("expected a reply");
        };
        let snapshot: crate::shared_data::ControllerSnapshot =
            serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, controller.get_state());
    }

    #[tokio::test]
    async fn cli_applies_lines_until_quit() {
        let controller =
            IntersectionController::new(ControllerConfig::default(), NullDisplay).unwrap();
        let script: &[u8] = b"red\n\nbogus\nyellow\nquit\ngreen\n";
        run_cli(controller.clone(), script).await.unwrap();

        assert_eq!(controller.active_direction(), Direction::EastWest);
        assert_eq!(controller.get_phase(), Phase::Yellow);
        // quit shut the controller down, so the yellow timer is gone
        assert!(!controller.get_state().yellow_timer_pending);
    }
}
