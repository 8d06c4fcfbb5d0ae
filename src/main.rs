//! midicloro - MIDI clock generator and router

use clap::Parser;
use cloro::io::{list_input_devices, list_output_devices, PortInfo};
use cloro::{Config, Midicloro, Result, Wizard};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "midicloro", version)]
#[command(about = "MIDI clock generator and router", long_about = None)]
struct Cli {
    /// Run the interactive setup and write the config file
    #[arg(short = 'c', long)]
    configure: bool,

    /// List MIDI ports and exit
    #[arg(short, long)]
    list: bool,

    /// Config file path
    #[arg(long, value_name = "PATH", default_value = cloro::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if cli.list {
        print_ports("Input ports", &list_input_devices());
        print_ports("Output ports", &list_output_devices());
        return Ok(());
    }
    if cli.configure {
        return configure(&cli.config);
    }

    let config = Config::load(&cli.config)?;
    info!("Loaded {}", cli.config.display());
    Midicloro::start(&config)?.run_until_signal()
}

fn configure(path: &Path) -> Result<()> {
    let stdin = io::stdin();
    let mut wizard = Wizard::new(stdin.lock(), io::stdout());

    if path.exists() && !wizard.confirm_overwrite()? {
        println!("Exiting");
        return Ok(());
    }
    let config = wizard.run(&list_input_devices(), &list_output_devices())?;
    config.save(path)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn print_ports(title: &str, ports: &[PortInfo]) {
    println!("{}:", title);
    for port in ports {
        println!("  {}. {}", port.index, port.name);
    }
}
