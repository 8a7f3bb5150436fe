//! 素朴な全探索による参照実装。
//!
//! 転送行列法の結果を検証するため、小さな盤面で経路と閉路を
//! 深さ優先探索で直接数える。結果は丸めのない整数 (`BigUint`) で返す。

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::config::{CountMode, GridConfig};
use crate::error::{GridError, Result};
use crate::profile::{Profile, Symbol};

/// 全探索を許す最大の盤面。
///
/// 訪問集合を u64 のビットで持つので N² ≤ 64。
/// 探索の枝 1 本ぶんの数は N = 8 でも 10^12 程度で u64 に収まり、
/// 枝どうしの合計は `BigUint` で取る。
pub const MAX_REFERENCE_SIZE: usize = 8;

/// 訪問済み頂点をビットで持つ N×N 格子
struct Grid {
    n: usize,
}

impl Grid {
    #[inline]
    fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> {
        let n = self.n;
        let (r, c) = (v / n, v % n);
        let up = (r > 0).then(|| v - n);
        let down = (r + 1 < n).then(|| v + n);
        let left = (c > 0).then(|| v - 1);
        let right = (c + 1 < n).then(|| v + 1);
        [up, down, left, right].into_iter().flatten()
    }

    /// `v` から `goal` への単純パスの数 (`visited` に `v` を含む)
    fn paths_from(&self, v: usize, goal: usize, visited: u64) -> u64 {
        if v == goal {
            return 1;
        }
        self.neighbors(v)
            .filter(|&w| visited & (1 << w) == 0)
            .map(|w| self.paths_from(w, goal, visited | (1 << w)))
            .sum()
    }

    /// 最小頂点 `start` から出て `start` に戻る閉路を、向き付きで数える。
    ///
    /// `start` より小さい頂点は使わない。`len` はこれまでに通った頂点数。
    fn cycles_from(&self, start: usize, v: usize, visited: u64, len: usize, full: Option<usize>) -> u64 {
        let mut count = 0;
        for w in self.neighbors(v) {
            if w == start {
                // 格子に三角形はないので長さ 4 以上
                if len >= 4 && full.map_or(true, |f| len == f) {
                    count += 1;
                }
            } else if w > start && visited & (1 << w) == 0 {
                count += self.cycles_from(start, w, visited | (1 << w), len + 1, full);
            }
        }
        count
    }
}

fn check_size(n: usize) -> Result<Grid> {
    if !(2..=MAX_REFERENCE_SIZE).contains(&n) {
        return Err(GridError::GridSize(n));
    }
    Ok(Grid { n })
}

/// 左下角から右上角への単純パスの数
pub fn count_paths_exact(n: usize) -> Result<BigUint> {
    let grid = check_size(n)?;
    let goal = n * n - 1;
    // 最初の一歩ごとに並列化
    let total: BigUint = grid
        .neighbors(0)
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|w| BigUint::from(grid.paths_from(w, goal, 1 | (1 << w))))
        .sum();
    Ok(total)
}

/// 単純閉路の数 (`hamiltonian` なら全頂点を通るものだけ)
pub fn count_cycles_exact(n: usize, hamiltonian: bool) -> Result<BigUint> {
    let grid = check_size(n)?;
    let full = hamiltonian.then_some(n * n);
    let directed: BigUint = (0..n * n)
        .into_par_iter()
        .map(|start| BigUint::from(grid.cycles_from(start, start, 1 << start, 1, full)))
        .sum();
    // 各閉路は 2 方向で数えられている
    Ok(directed / 2u32)
}

/// 設定のモードに応じた真の数
pub fn reference_count(config: &GridConfig) -> Result<BigUint> {
    match config.mode() {
        CountMode::Paths => count_paths_exact(config.grid_size),
        CountMode::Cycles => count_cycles_exact(config.grid_size, false),
        CountMode::Hamiltonian => count_cycles_exact(config.grid_size, true),
    }
}

/// 真の数を法 `modulus` で割った余り
pub fn reference_residue(config: &GridConfig, modulus: u64) -> Result<u64> {
    let exact = reference_count(config)?;
    let residue = exact % BigUint::from(modulus);
    Ok(residue.to_u64().unwrap_or_default())
}

/// 半状態の向き
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Low,
    High,
}

/// 括弧の対応をスタックで直接調べて半状態を列挙する (パック値の昇順)。
///
/// - 下半分: 下から読み、RIGHT は直近の未対応 LEFT と対になる。
///   未対応の RIGHT はサイクルモードで 0 個、パスモードで 1 個まで。
/// - 上半分: 上から読み、LEFT は直近の未対応 RIGHT と対になる。未対応の LEFT は不可。
pub fn reference_half_states(cells: usize, half: Half, cycles: bool) -> Vec<u64> {
    let alphabet = [Symbol::Blank, Symbol::Left, Symbol::Right];
    let mut states = Vec::new();
    let total = 3usize.pow(cells as u32);
    for code in 0..total {
        let mut rest = code;
        let symbols: Vec<Symbol> = (0..cells)
            .map(|_| {
                let s = alphabet[rest % 3];
                rest /= 3;
                s
            })
            .collect();
        let valid = match half {
            Half::Low => {
                let mut open = 0usize;
                let mut unmatched = 0usize;
                for &s in &symbols {
                    match s {
                        Symbol::Left => open += 1,
                        Symbol::Right if open > 0 => open -= 1,
                        Symbol::Right => unmatched += 1,
                        _ => {}
                    }
                }
                unmatched <= if cycles { 0 } else { 1 }
            }
            Half::High => {
                let mut open = 0usize;
                let mut ok = true;
                for &s in symbols.iter().rev() {
                    match s {
                        Symbol::Right => open += 1,
                        Symbol::Left if open > 0 => open -= 1,
                        Symbol::Left => ok = false,
                        _ => {}
                    }
                }
                ok
            }
        };
        if valid {
            states.push(Profile::from_symbols(&symbols).0);
        }
    }
    states.sort_unstable();
    states
}
