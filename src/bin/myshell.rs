use std::env;
use std::path::{Path, PathBuf};
use std::process;

use docopt::Docopt;
use log::{debug, error, warn};
use myshell::shell::{isatty, DEFAULT_DRAIN_INTERVAL};
use myshell::{create_shell, BatchSource, Error, Shell, ShellConfig};
use nix::unistd::Pid;
use serde::Deserialize;

const LOG_FILE_NAME: &str = ".myshell_log";
const SHELL_NAME: &str = "myshell";

const USAGE: &str = "
myshell.

Usage:
    myshell [options] [<file>]
    myshell [options] -c <command>
    myshell (-h | --help)
    myshell --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              Run a single command line, then wait for background jobs and exit.
    --log=<path>    File to write log to, defaults to ~/.myshell_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    if args.flag_version {
        println!("myshell version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    set_shell_environment();

    if let Some(ref command) = args.arg_command {
        execute_from_command_string(command);
    } else if let Some(ref file_path) = args.arg_file {
        execute_from_file(Path::new(file_path));
    } else {
        execute_from_stdin();
    }
}

fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => return,
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("myshell: unable to open log file {}: {}", log_path.display(), e);
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(log_file)
        .apply();

    if let Err(e) = result {
        eprintln!("myshell: unable to set up logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

/// Exposes the shell's own path to the programs it launches as `shell` and
/// `parent`.
fn set_shell_environment() {
    let shell_path = env::current_exe().or_else(|_| {
        env::current_dir().map(|cwd| cwd.join(SHELL_NAME))
    });

    match shell_path {
        Ok(shell_path) => {
            env::set_var("shell", &shell_path);
            env::set_var("parent", &shell_path);
        }
        Err(e) => warn!("unable to determine shell path: {}", e),
    }
}

fn execute_from_command_string(command: &str) -> ! {
    let mut shell = new_shell(ShellConfig::noninteractive());
    shell.run(&mut BatchSource::from_lines(vec![command]));
    shell.exit()
}

fn execute_from_file(path: &Path) -> ! {
    let mut shell = new_shell(ShellConfig::noninteractive());
    if let Err(e) = shell.execute_commands_from_file(path) {
        error!("failed to run batch file {}: {}", path.display(), e);
        eprintln!("myshell: {}: {}", path.display(), e);
        process::exit(1);
    }

    shell.exit()
}

fn execute_from_stdin() -> ! {
    let shell_config = if isatty() {
        ShellConfig::interactive(DEFAULT_DRAIN_INTERVAL)
    } else {
        ShellConfig::noninteractive()
    };

    let mut shell = new_shell(shell_config);
    shell.execute_from_stdin();
    shell.exit()
}

fn new_shell(config: ShellConfig) -> Box<dyn Shell> {
    create_shell(config).unwrap_or_else(|e| display_error_and_exit(&e))
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("failed to create shell: {}", error);
    eprintln!("myshell: {}", error);
    process::exit(1);
}
