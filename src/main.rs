use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use grid_path_counter::*;

/// N×N 格子の角から角へのパス (またはサイクル) の数を法 MODULUS で数える。
///
/// N・モード・カウンタ幅・スレッド数はビルド時に GRID_* 環境変数で固定される。
#[derive(Parser, Debug)]
#[command(name = "grid-path-counter", version, about)]
struct Cli {
    /// 法 (2 以上、カウンタ幅の上限以下の整数)
    modulus: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_banner(config: &GridConfig, modulus: u64) {
    println!("N = {}", config.grid_size);
    println!("bits = {}", config.counter_bits);
    match config.mode() {
        CountMode::Paths => println!("cycles = false"),
        CountMode::Cycles => println!("cycles = true"),
        CountMode::Hamiltonian => println!("cycles = true (hamiltonian)"),
    }
    println!("threads = {}", config.thread_count);
    println!("mod = {modulus}");
}

/// 進捗を同じ行に上書きする
fn write_progress(out: &mut impl Write, p: &Progress) -> io::Result<()> {
    write!(out, "counting = {}/{} ({}) \r", p.row, p.rows, p.step)?;
    out.flush()
}

fn run(config: GridConfig, modulus: u64) -> Result<CountOutcome> {
    let runner = GridRunner::new(config)?;
    println!("memory = {}MB", runner.memory_bytes().div_ceil(1 << 20));

    let mut stdout = io::stdout();
    let outcome = runner.count(modulus, |p| {
        // 表示の失敗 (パイプ切れなど) は計算を止めない
        let _ = write_progress(&mut stdout, &p);
    })?;
    println!();
    Ok(outcome)
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let config = GridConfig::from_build();

    let modulus = match config.validate().and_then(|_| config.parse_modulus(&cli.modulus)) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    print_banner(&config, modulus);
    match run(config, modulus) {
        Ok(outcome) => {
            println!("solution = {} mod {}", outcome.residue, outcome.modulus);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
