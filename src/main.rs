use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use perfsill::commands;

fn build_cli() -> Command {
    Command::new("perfsill")
        .version(env!("CARGO_PKG_VERSION"))
        .about("CPU, memory and GPU utilization sampler")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Read configuration from PATH instead of the default location")
                .global(true),
        )
        .subcommand(
            Command::new("monitor")
                .about("Sample continuously until Ctrl+C")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Sampling interval in milliseconds")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("N")
                        .help("Stop after N samples")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON object per sample")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-gpu")
                        .long("no-gpu")
                        .help("Skip GPU utilization")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Take a single sample")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Measurement window for CPU usage in milliseconds")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the sample as JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-gpu")
                        .long("no-gpu")
                        .help("Skip GPU utilization")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("gpu").about("Show GPU detection and counter session state"))
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    perfsill::init_logging();

    let matches = build_cli().get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor::execute(sub_matches),
        Some(("snapshot", sub_matches)) => commands::snapshot::execute(sub_matches),
        Some(("gpu", sub_matches)) => commands::gpu::execute(sub_matches),
        Some(("version", _)) => commands::version(),
        _ => {
            println!("No command provided. Use 'perfsill --help' for usage information.");
            Ok(())
        }
    }
}
