//! ビルド時設定の生成。
//!
//! 盤面サイズ・数え上げモード・カウンタ幅・スレッド数はビルドごとに固定する。
//! 環境変数から読み取り、`$OUT_DIR/build_config.rs` に定数として書き出す。
//!
//! - `GRID_N`           盤面サイズ N (既定 6)
//! - `GRID_CYCLES`      1 ならサイクルを数える (既定 0 = 角から角へのパス)
//! - `GRID_HAMILTONIAN` 1 ならハミルトン閉路のみ (GRID_CYCLES=1 が前提)
//! - `GRID_BITS`        カウンタ幅 8/16/32/64 (既定 64)
//! - `GRID_THREADS`     ワーカースレッド数 (既定 4)

use std::env;
use std::fs;
use std::path::PathBuf;

const VARS: [&str; 5] = [
    "GRID_N",
    "GRID_CYCLES",
    "GRID_HAMILTONIAN",
    "GRID_BITS",
    "GRID_THREADS",
];

fn read_number(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .unwrap_or_else(|_| panic!("{name} must be a non-negative integer, got {raw:?}")),
        Err(_) => default,
    }
}

fn read_flag(name: &str) -> bool {
    read_number(name, 0) != 0
}

fn main() {
    for var in VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }
    println!("cargo:rerun-if-changed=build.rs");

    let grid_size = read_number("GRID_N", 6);
    let count_cycles = read_flag("GRID_CYCLES");
    // ハミルトン指定はサイクルモードでのみ意味を持つ
    let hamiltonian_only = count_cycles && read_flag("GRID_HAMILTONIAN");
    let counter_bits = read_number("GRID_BITS", 64);
    let thread_count = read_number("GRID_THREADS", 4);

    if !matches!(counter_bits, 8 | 16 | 32 | 64) {
        panic!("GRID_BITS must be one of 8, 16, 32, 64, got {counter_bits}");
    }

    let generated = format!(
        "pub const GRID_SIZE: usize = {grid_size};\n\
         pub const COUNT_CYCLES: bool = {count_cycles};\n\
         pub const HAMILTONIAN_ONLY: bool = {hamiltonian_only};\n\
         pub const COUNTER_BITS: u32 = {counter_bits};\n\
         pub const THREAD_COUNT: usize = {thread_count};\n"
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("build_config.rs"), generated).expect("failed to write build_config.rs");
}
