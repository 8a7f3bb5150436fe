//! 線分の結合と端の付け替え。
//!
//! 2 つの開いた線分が 1 セルで出会うと、外側に残る端の一方の向きが変わる。
//! 相手の端は括弧対応で探す。近い 8 セルは 16 ビット窓の参照表で一度に引き、
//! 見つからなければ残りを 1 セルずつ走査する。

use crate::error::{try_alloc, Result};
use crate::profile::{Profile, Symbol};

/// 参照表 1 回で調べるセル数
pub const WINDOW_CELLS: usize = 8;
const WINDOW_SIZE: usize = 1 << (2 * WINDOW_CELLS);
const WINDOW_MASK: u64 = WINDOW_SIZE as u64 - 1;

/// 窓の参照表。
///
/// 値 ≥ 0 は窓内で対応が閉じたセルのオフセット、
/// 値 < 0 は窓を抜けた時点で残っている深さ (の符号反転)。
pub struct MergeTables {
    left: Vec<i8>,
    right: Vec<i8>,
}

/// 窓の下端から上へ、深さ 1 の LEFT に対応する RIGHT を探す。
fn scan_window_up(codes: Profile) -> i8 {
    let mut depth = 1;
    for i in 0..WINDOW_CELLS {
        depth += 2 - codes.code_at(i);
        if depth == 0 {
            return i as i8;
        }
    }
    -(depth as i8)
}

/// 窓の上端から下へ、深さ 1 の RIGHT に対応する LEFT を探す。
fn scan_window_down(codes: Profile) -> i8 {
    let mut depth = 1;
    for i in 0..WINDOW_CELLS {
        depth += codes.code_at(WINDOW_CELLS - 1 - i) - 2;
        if depth == 0 {
            return i as i8;
        }
    }
    -(depth as i8)
}

impl MergeTables {
    pub fn build() -> Result<Self> {
        let mut left = try_alloc(WINDOW_SIZE, "merge tables", || 0i8)?;
        let mut right = try_alloc(WINDOW_SIZE, "merge tables", || 0i8)?;
        for w in 0..WINDOW_SIZE {
            let codes = Profile(w as u64).scan_codes();
            left[w] = scan_window_up(codes);
            right[w] = scan_window_down(codes);
        }
        Ok(MergeTables { left, right })
    }

    pub fn memory_bytes(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// (LEFT, LEFT) の結合。
    ///
    /// `state` はセル col, col+1 を消したあとのプロファイル。
    /// 上側の LEFT に対応していた RIGHT (セル col+2 以上) を LEFT に付け替える。
    /// 対応が見つからなければ `None`。
    pub fn replace_left(&self, state: Profile, col: usize) -> Option<Profile> {
        let base = col + 2;
        let seg = state.0 >> (2 * base);
        let found = self.left[(seg & WINDOW_MASK) as usize];
        if found >= 0 {
            return Some(state.with_symbol(base + found as usize, Symbol::Left));
        }

        // 窓の外を 1 セルずつ
        let mut depth = -(found as i32);
        let mut rest = Profile(seg >> (2 * WINDOW_CELLS)).scan_codes().0;
        let mut pos = base + WINDOW_CELLS;
        while rest != 0 {
            depth += 2 - (rest & 0b11) as i32;
            if depth == 0 {
                return Some(state.with_symbol(pos, Symbol::Left));
            }
            rest >>= 2;
            pos += 1;
        }
        None
    }

    /// (RIGHT, RIGHT) の結合。
    ///
    /// セル col より下で、セル col の RIGHT に対応していた LEFT を RIGHT に付け替える。
    pub fn replace_right(&self, state: Profile, col: usize) -> Option<Profile> {
        let below = state.low(col);
        let seg = if col >= WINDOW_CELLS {
            below >> (2 * (col - WINDOW_CELLS))
        } else {
            // 盤面の外は BLANK で埋める
            below << (2 * (WINDOW_CELLS - col))
        };
        let found = self.right[seg as usize];
        if found >= 0 {
            return Some(state.with_symbol(col - 1 - found as usize, Symbol::Right));
        }

        let mut depth = -(found as i32);
        let codes = state.scan_codes();
        let mut pos = col.checked_sub(WINDOW_CELLS)?;
        while pos > 0 {
            pos -= 1;
            depth += codes.code_at(pos) - 2;
            if depth == 0 {
                return Some(state.with_symbol(pos, Symbol::Right));
            }
        }
        None
    }
}

/// (RIGHT, RIGHT) の結合を上半分 (セル `low_cells` 以上) の走査だけで試みる。
///
/// 相手が下半分にある場合は `None` を返し、呼び出し側は
/// 状態ごとの `replace_right` に切り替える。
pub fn replace_right_high(state: Profile, col: usize, low_cells: usize) -> Option<Profile> {
    let codes = state.scan_codes();
    let mut depth = 1;
    let mut pos = col;
    while pos > low_cells {
        pos -= 1;
        depth += codes.code_at(pos) - 2;
        if depth == 0 {
            return Some(state.with_symbol(pos, Symbol::Right));
        }
    }
    None
}
