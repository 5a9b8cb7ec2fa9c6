use directories::ProjectDirs;
use flexi_logger::{detailed_format, Logger};
use log::{debug, error};

use openhours::cli::Cli;
use openhours::config::{Config, CONFIG};

fn main() {
    let Some(project_dirs) = ProjectDirs::from("", "", "openhours") else {
        eprintln!("Could not determine a home directory for openhours data");
        std::process::exit(1);
    };

    let config = Config::load_config(&project_dirs);

    // RUST_LOG, when set, overrides the configured level
    let _logger = match Logger::try_with_env_or_str(config.logging.log_spec())
        .and_then(|logger| logger.log_to_stderr().format(detailed_format).start())
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to start logger: {}", e);
            None
        }
    };

    let _ = CONFIG.set(config);
    debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

    if let Err(err) = Cli::handle_command_line(&project_dirs) {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
