//! ビルド時設定と法の検証。
//!
//! 盤面サイズ N・モード・カウンタ幅・スレッド数は `build.rs` が生成する定数で固定される。
//! ライブラリ利用者 (とテスト) は `GridConfig` を直接組み立ててもよい。

use crate::error::{GridError, Result};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/build_config.rs"));
}

/// 対応する盤面サイズの下限
pub const MIN_GRID_SIZE: usize = 2;
/// 対応する盤面サイズの上限 (プロファイルが 64 ビットワードに収まる範囲)
pub const MAX_GRID_SIZE: usize = 30;

/// 数え上げモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// 左下角から右上角への単純パス
    Paths,
    /// 単純閉路 (長さ 4 以上)
    Cycles,
    /// 全頂点を通る閉路
    Hamiltonian,
}

/// 1 回の数え上げの固定パラメータ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub grid_size: usize,
    pub count_cycles: bool,
    pub hamiltonian_only: bool,
    pub counter_bits: u32,
    pub thread_count: usize,
}

impl GridConfig {
    /// `build.rs` が埋め込んだ設定。
    pub fn from_build() -> Self {
        GridConfig {
            grid_size: generated::GRID_SIZE,
            count_cycles: generated::COUNT_CYCLES,
            hamiltonian_only: generated::HAMILTONIAN_ONLY,
            counter_bits: generated::COUNTER_BITS,
            thread_count: generated::THREAD_COUNT,
        }
    }

    /// 64 ビットカウンタ・1 スレッドの設定を作る。
    pub fn new(grid_size: usize, mode: CountMode) -> Self {
        GridConfig {
            grid_size,
            count_cycles: mode != CountMode::Paths,
            hamiltonian_only: mode == CountMode::Hamiltonian,
            counter_bits: 64,
            thread_count: 1,
        }
    }

    pub fn with_counter_bits(mut self, bits: u32) -> Self {
        self.counter_bits = bits;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.thread_count = threads;
        self
    }

    pub fn mode(&self) -> CountMode {
        match (self.count_cycles, self.hamiltonian_only) {
            (false, _) => CountMode::Paths,
            (true, false) => CountMode::Cycles,
            (true, true) => CountMode::Hamiltonian,
        }
    }

    /// ハミルトン閉路モードか (サイクルモードのときのみ真)
    #[inline]
    pub fn is_hamiltonian(&self) -> bool {
        self.count_cycles && self.hamiltonian_only
    }

    /// 下半分のセル数 ⌊N/2⌋
    #[inline]
    pub fn low_cells(&self) -> usize {
        self.grid_size / 2
    }

    /// 上半分のセル数 ⌈N/2⌉
    #[inline]
    pub fn high_cells(&self) -> usize {
        (self.grid_size + 1) / 2
    }

    /// (RIGHT, RIGHT) の相手探索を上半分だけで試みる最小の列。
    #[inline]
    pub fn fast_merge_min_col(&self) -> usize {
        self.low_cells() + 1
    }

    pub fn max_modulus(&self) -> u64 {
        max_modulus(self.counter_bits)
    }

    /// 設定値の範囲検査。計算の前に一度だけ呼ぶ。
    pub fn validate(&self) -> Result<()> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(GridError::GridSize(self.grid_size));
        }
        if !matches!(self.counter_bits, 8 | 16 | 32 | 64) {
            return Err(GridError::CounterBits(self.counter_bits));
        }
        if self.thread_count == 0 {
            return Err(GridError::ThreadCount);
        }
        if self.hamiltonian_only && !self.count_cycles {
            return Err(GridError::HamiltonianWithoutCycles);
        }
        Ok(())
    }

    /// 法がこの設定のカウンタ幅で使えるか検査する。
    pub fn check_modulus(&self, modulus: u64) -> Result<u64> {
        let max = self.max_modulus();
        if modulus < 2 || modulus > max {
            return Err(GridError::ModulusOutOfRange { value: modulus, max });
        }
        Ok(modulus)
    }

    /// コマンドライン文字列から法を読み取り、範囲検査まで行う。
    pub fn parse_modulus(&self, raw: &str) -> Result<u64> {
        let modulus = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| GridError::ModulusParse(raw.to_string()))?;
        self.check_modulus(modulus)
    }
}

/// カウンタ幅 `bits` で使える最大の法。
///
/// 64 ビットでは加算 a + b (a, b ≤ m) が u64 を溢れないよう 2^63 − 1 に制限する。
/// 8/16/32/64 以外は 0 (どの法も通らない)。
pub fn max_modulus(bits: u32) -> u64 {
    match bits {
        8 | 16 | 32 => (1u64 << bits) - 1,
        64 => (1u64 << 63) - 1,
        _ => 0,
    }
}

const MODULI_8: [u64; 54] = [
    251, 241, 239, 233, 229, 227, 223, 211, 199, 197,
    193, 191, 181, 179, 173, 167, 163, 157, 151, 149,
    139, 137, 131, 127, 113, 109, 107, 103, 101, 97,
    89, 83, 79, 73, 71, 67, 61, 59, 53, 47,
    43, 41, 37, 31, 29, 23, 19, 17, 13, 11,
    7, 5, 3, 2,
];

const MODULI_16: [u64; 50] = [
    65521, 65519, 65497, 65479, 65449, 65447, 65437, 65423, 65419, 65413,
    65407, 65393, 65381, 65371, 65357, 65353, 65327, 65323, 65309, 65293,
    65287, 65269, 65267, 65257, 65239, 65213, 65203, 65183, 65179, 65173,
    65171, 65167, 65147, 65141, 65129, 65123, 65119, 65111, 65101, 65099,
    65089, 65071, 65063, 65053, 65033, 65029, 65027, 65011, 65003, 64997,
];

const MODULI_32: [u64; 30] = [
    4294966661, 4294966657, 4294966651, 4294966639, 4294966619,
    4294966591, 4294966583, 4294966553, 4294966477, 4294966447,
    4294966441, 4294966427, 4294966373, 4294966367, 4294966337,
    4294966297, 4294966243, 4294966237, 4294966231, 4294966217,
    4294966187, 4294966177, 4294966163, 4294966153, 4294966129,
    4294966121, 4294966099, 4294966087, 4294966073, 4294966043,
];

const MODULI_64: [u64; 18] = [
    9223372036854775783,
    9223372036854775643,
    9223372036854775549,
    9223372036854775507,
    9223372036854775433,
    9223372036854775421,
    9223372036854775417,
    9223372036854775399,
    9223372036854775351,
    9223372036854775337,
    9223372036854775291,
    9223372036854775279,
    9223372036854775259,
    9223372036854775181,
    9223372036854775159,
    9223372036854775139,
    9223372036854775097,
    9223372036854775073,
];

/// カウンタ幅ごとの推奨の法 (その幅に収まる大きい素数、降順)。
///
/// 複数の法で数えた剰余から中国剰余定理で真値を復元する用途を想定している。
pub fn suggested_moduli(bits: u32) -> &'static [u64] {
    match bits {
        8 => &MODULI_8,
        16 => &MODULI_16,
        32 => &MODULI_32,
        64 => &MODULI_64,
        _ => &[],
    }
}
