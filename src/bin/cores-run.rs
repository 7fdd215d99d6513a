use std::fmt::Display;
use std::io::{self, Write};

use anyhow::Result;
use booth_gcd_cores::bench::DEFAULT_CYCLE_LIMIT;
use booth_gcd_cores::{Bench, BoothCore, GcdCore, TraceSample};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cores-run")]
#[command(about = "Drive an enable-gated arithmetic core cycle by cycle")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Abandon a run after this many clock edges.
    #[arg(long, global = true, default_value_t = DEFAULT_CYCLE_LIMIT)]
    limit: u64,

    /// Print every committed clock edge before the report.
    #[arg(long, global = true)]
    trace: bool,

    /// Emit the run report as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Greatest common divisor by repeated subtraction.
    Gcd { a: u32, b: u32 },
    /// Signed 32 x 32 -> 64 bit Booth multiplication.
    Booth {
        #[arg(allow_hyphen_values = true)]
        m: i32,
        #[arg(allow_hyphen_values = true)]
        q: i32,
    },
}

#[derive(Serialize)]
struct Report<R> {
    op: &'static str,
    result: R,
    cycles: u64,
}

fn print_trace<R: Display>(samples: Option<&[TraceSample<R>]>) {
    let Some(samples) = samples else { return };
    for sample in samples {
        println!(
            "cycle {:>6}  {:<4?}  done={}  result={}",
            sample.cycle,
            sample.phase,
            u8::from(sample.done),
            sample.result
        );
    }
}

fn emit<R: Display + Serialize>(report: &Report<R>, json: bool) -> Result<()> {
    if json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer(&mut handle, report)?;
        writeln!(handle)?;
    } else {
        println!(
            "{}: result={} cycles={}",
            report.op, report.result, report.cycles
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    match args.command {
        Command::Gcd { a, b } => {
            let mut bench = Bench::new(GcdCore::default()).with_limit(args.limit);
            if args.trace {
                bench.record_trace();
            }
            let run = bench.run(a, b)?;
            print_trace(bench.trace());
            emit(
                &Report {
                    op: "gcd",
                    result: run.result,
                    cycles: run.cycles,
                },
                args.json,
            )?;
        }
        Command::Booth { m, q } => {
            let mut bench = Bench::new(BoothCore::default()).with_limit(args.limit);
            if args.trace {
                bench.record_trace();
            }
            let run = bench.run(m, q)?;
            print_trace(bench.trace());
            emit(
                &Report {
                    op: "booth",
                    result: run.result,
                    cycles: run.cycles,
                },
                args.json,
            )?;
        }
    }
    Ok(())
}
