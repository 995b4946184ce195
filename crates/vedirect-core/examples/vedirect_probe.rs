//! VE.Direct Probe Tool
//!
//! A standalone tool to check a VE.Direct device and read fields from it.
//!
//! Usage:
//!   cargo run --example vedirect_probe -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: first VE.Direct cable found)
//!   --timeout MS      Liveness timeout in ms (default: 5000)
//!   --lines N         Line budget per read (default: 50)
//!   --field LABEL     Read only this label (V, I, P, PPV, SOC, Alarm)
//!   --dump            Print every line within the line budget
//!   --demo            Use the simulated device instead of a serial port
//!   --list            List serial ports and exit

use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vedirect_core::prelude::*;
use vedirect_core::protocol::list_ports;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port_name: Option<String> = None;
    let mut config = ReaderConfig::default();
    let mut field: Option<FieldId> = None;
    let mut dump = false;
    let mut demo = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                if i < args.len() {
                    port_name = Some(args[i].clone());
                }
            }
            "--timeout" | "-t" => {
                i += 1;
                if i < args.len() {
                    config.timeout_ms = args[i].parse().unwrap_or(config.timeout_ms);
                }
            }
            "--lines" | "-n" => {
                i += 1;
                if i < args.len() {
                    config.max_read_lines = args[i].parse().unwrap_or(config.max_read_lines);
                }
            }
            "--field" | "-f" => {
                i += 1;
                if i < args.len() {
                    match args[i].parse::<FieldId>() {
                        Ok(f) => field = Some(f),
                        Err(e) => {
                            eprintln!("{}", e);
                            return;
                        }
                    }
                }
            }
            "--dump" => dump = true,
            "--demo" => demo = true,
            "--list" => {
                print_ports();
                return;
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            arg if !arg.starts_with('-') => {
                port_name = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
            }
        }
        i += 1;
    }

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        return;
    }

    if demo {
        println!("Using simulated device");
        let reader = ProtocolReader::new(DemoDevice::new(), config);
        run(reader, field, dump);
        return;
    }

    let port_name = match port_name.or_else(|| list_ports().into_iter().next().map(|p| p.name)) {
        Some(name) => name,
        None => {
            eprintln!("No serial ports found. Pass one with --port or try --demo");
            return;
        }
    };

    println!("Opening {} at {} baud...", port_name, config.baud_rate);
    let reader = match ProtocolReader::connect(&port_name, config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to open VE.Direct device: {}", e);
            eprintln!("   Check the cable and that you have permission (dialout group)");
            return;
        }
    };
    println!("Device responding");
    run(reader, field, dump);
}

fn run<T: Transport>(mut reader: ProtocolReader<T>, field: Option<FieldId>, dump: bool) {
    if dump {
        let mut print_line = |line: &str| println!("  {:?}", line);
        match reader.dump(&mut print_line) {
            Ok(n) => println!("{} lines", n),
            Err(e) => eprintln!("Dump failed: {}", e),
        }
        return;
    }

    let fields: Vec<FieldId> = match field {
        Some(f) => vec![f],
        None => FieldId::ALL.into_iter().filter(|f| !f.is_dump()).collect(),
    };

    for f in fields {
        let start = Instant::now();
        let result = reader.read_field(f);
        let stats = reader.last_scan();
        match result {
            Ok(value) => println!(
                "  {:<6} = {:>8}   ({} lines skipped, {}ms)",
                f.label(),
                value,
                stats.lines_discarded,
                start.elapsed().as_millis()
            ),
            Err(e) => println!("  {:<6} : {}", f.label(), e),
        }
    }
}

fn print_ports() {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        let marker = if port.is_ve_direct_cable() { "*" } else { " " };
        println!(
            "{} {}  {}",
            marker,
            port.name,
            port.product.as_deref().unwrap_or("")
        );
    }
}

fn print_help() {
    println!("VE.Direct Probe Tool");
    println!();
    println!("Usage: vedirect_probe [OPTIONS] [PORT]");
    println!();
    println!("Options:");
    println!("  --port, -p PORT     Serial port (default: first VE.Direct cable found)");
    println!("  --timeout, -t MS    Liveness timeout in ms (default: 5000)");
    println!("  --lines, -n N       Line budget per read (default: 50)");
    println!("  --field, -f LABEL   Read only this label (V, I, P, PPV, SOC, Alarm)");
    println!("  --dump              Print every line within the line budget");
    println!("  --demo              Use the simulated device");
    println!("  --list              List serial ports (* marks VE.Direct cables)");
    println!("  --help, -h          Show this help");
}
