use std::{fs::File, os::unix::prelude::AsRawFd, path::Path};

use fsco::{
    analyze,
    config::Config,
    die,
    table::Table,
};

include!(concat!(env!("OUT_DIR"), "/version.rs"));

use clap::Parser;

/// round-wise EFEI force-scan screening
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// input file
    #[arg(value_parser, default_value_t = String::from("fsco.toml"))]
    infile: String,

    /// Overwrite existing output from a previous run. Defaults to false.
    #[arg(short, long, default_value_t = false)]
    overwrite: bool,

    /// Print the version and exit. Defaults to false.
    #[arg(short, long, default_value_t = false)]
    version: bool,

    /// Set the maximum number of threads to use. Defaults to 0, which means
    /// to use as many threads as there are CPUS.
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Serialize the input file to JSON and exit.
    #[arg(short, default_value_t = false, hide = true)]
    json: bool,
}

fn main() -> Result<(), std::io::Error> {
    env_logger::init();
    let args = Args::parse();
    if args.version {
        println!("version: {}", version());
        return Ok(());
    }
    if args.json {
        let config = Config::load(&args.infile);
        match serde_json::to_string(&config) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                die!("failed to serialize {} with {e}", args.infile);
            }
        };
        return Ok(());
    }
    let path = Path::new("fsco.out");
    if path.exists() && !args.overwrite {
        die!("existing fsco output. overwrite with -o/--overwrite");
    }
    let outfile = File::create(path).expect("failed to create outfile");
    let logfile = File::create("fsco.log").expect("failed to create log file");
    let out_fd = outfile.as_raw_fd();
    let log_fd = logfile.as_raw_fd();
    // redirect stdout to outfile and stderr to logfile
    unsafe {
        libc::dup2(out_fd, 1);
        libc::dup2(log_fd, 2);
    }
    let config = Config::load(&args.infile);
    println!("PID: {}", std::process::id());
    println!("version: {}", version());
    println!("{config}");
    fsco::max_threads(args.threads);

    let mut table = match Table::load(&config.table) {
        Ok(t) => t,
        Err(e) => die!("failed to load {} with {e}", config.table),
    };

    let summary = analyze::run(&mut table, &config);

    if let Err(e) = table.write(&config.table) {
        die!("failed to write {} with {e}", config.table);
    }

    println!(
        "\n{} continuing, {} concluded, {} failed",
        summary.continuing, summary.concluded, summary.failed
    );
    println!("normal termination of fsco");

    Ok(())
}
