use intersection_controller::command::run_cli;
use intersection_controller::control_system::signal_head::LogDisplay;
use intersection_controller::{ControllerConfig, IntersectionController};
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    env_logger::init();

    // An explicit path argument wins over TLC_CONFIG.
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::from_file(path),
        None => ControllerConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    let controller = match IntersectionController::new(config, LogDisplay) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("Controller error: {}", e);
            std::process::exit(1);
        }
    };

    println!("Starting intersection controller...");
    controller.start_auto_mode();

    if let Err(e) = run_cli(controller.clone(), BufReader::new(tokio::io::stdin())).await {
        eprintln!("CLI error: {}", e);
    }
    controller.shutdown();
}
