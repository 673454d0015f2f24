use clap::Parser;
use ccproxy::cli::capture::capture_error_json;
use ccproxy::cli::{
    handle_capture_start, handle_capture_status, handle_capture_stop, handle_config_check,
    handle_config_init, CaptureCommands, Cli, Commands, ConfigCommands,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn print_output(result: CliResult<String>) -> CliResult<()> {
    result.map(|output| println!("{}", output))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => ccproxy::cli::serve::run_serve(args).await,
        Commands::Capture(cmd) => match cmd {
            CaptureCommands::Start(args) => match handle_capture_start(&args) {
                Err(e) if args.json => {
                    println!("{}", capture_error_json(e.as_ref()));
                    std::process::exit(1);
                }
                result => print_output(result),
            },
            CaptureCommands::Stop(args) => {
                // Stop sleeps between signal probes
                match tokio::task::spawn_blocking(move || {
                    handle_capture_stop(&args).map_err(|e| e.to_string())
                })
                .await
                {
                    Ok(result) => print_output(result.map_err(Into::into)),
                    Err(e) => Err(e.into()),
                }
            }
            CaptureCommands::Status(args) => match handle_capture_status(&args) {
                Err(e) if args.json => {
                    println!("{}", capture_error_json(e.as_ref()));
                    std::process::exit(1);
                }
                result => print_output(result),
            },
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
            ConfigCommands::Check(args) => print_output(handle_config_check(&args)),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
