//! フロンティア状態 (プロファイル) の 2 ビットパック表現。
//!
//! 1 セルにつき 2 ビットの記号を持ち、セル i はビット 2i..2i+1 に置く。
//! セル 0 が盤面の下端、セル N−1 が上端に対応する。
//!
//! | 記号  | ビット | 意味 |
//! |-------|--------|------|
//! | BLANK | 00     | プラグなし |
//! | LEFT  | 01     | 開いた線分の下側の端 |
//! | RIGHT | 10     | 開いた線分の上側の端 (パスモードでは唯一の自由端も兼ねる) |
//! | BLOCK | 11     | 不正。保存されることはない |
//!
//! 括弧対応の走査はすべて `scan_codes` で写した値の上で行う。

use std::fmt;

/// 上位ビット (各セルの bit 1) のマスク
pub const HIGH_BITS: u64 = 0xaaaa_aaaa_aaaa_aaaa;
/// 下位ビット (各セルの bit 0) のマスク
pub const LOW_BITS: u64 = 0x5555_5555_5555_5555;

const SYMBOL_MASK: u64 = 0b11;
const PAIR_MASK: u64 = 0b1111;

/// 1 セルの記号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Symbol {
    Blank = 0,
    Left = 1,
    Right = 2,
    Block = 3,
}

impl Symbol {
    #[inline]
    pub const fn bits(self) -> u64 {
        self as u64
    }

    /// 下位 2 ビットを記号として読む。
    #[inline]
    pub const fn from_bits(bits: u64) -> Symbol {
        match bits & SYMBOL_MASK {
            0 => Symbol::Blank,
            1 => Symbol::Left,
            2 => Symbol::Right,
            _ => Symbol::Block,
        }
    }

    fn glyph(self) -> char {
        match self {
            Symbol::Blank => '.',
            Symbol::Left => 'L',
            Symbol::Right => 'R',
            Symbol::Block => '#',
        }
    }
}

/// 隣接 2 セル (上 = セル i+1, 下 = セル i) の 4 ビット窓。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair(u8);

impl Pair {
    /// (BLANK, BLANK)
    pub const EMPTY: Pair = Pair::new(Symbol::Blank, Symbol::Blank);
    /// (RIGHT, LEFT): 閉じる直前のループ
    pub const CLOSING: Pair = Pair::new(Symbol::Right, Symbol::Left);
    pub const LEFT_LEFT: Pair = Pair::new(Symbol::Left, Symbol::Left);
    pub const RIGHT_RIGHT: Pair = Pair::new(Symbol::Right, Symbol::Right);

    #[inline]
    pub const fn new(upper: Symbol, lower: Symbol) -> Pair {
        Pair(((upper as u8) << 2) | lower as u8)
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Pair {
        Pair((bits & PAIR_MASK) as u8)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0 as u64
    }

    #[inline]
    pub const fn upper(self) -> Symbol {
        Symbol::from_bits((self.0 >> 2) as u64)
    }

    #[inline]
    pub const fn lower(self) -> Symbol {
        Symbol::from_bits(self.0 as u64)
    }

    /// セルを 1 つ進めたときの窓の置き換え先。
    ///
    /// (B,B)→(R,L), (B,L)→(L,B), (B,R)→(R,B), (L,B)→(B,L), (R,B)→(B,R)。
    /// 両セルに端がある場合は (B,B) になり、線分の結合は呼び出し側が扱う。
    #[inline]
    pub const fn successor(self) -> Pair {
        const NEXT: [u8; 16] = [9, 4, 8, 0, 1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0];
        Pair(NEXT[self.0 as usize])
    }
}

impl fmt::Debug for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pair({}{})", self.upper().glyph(), self.lower().glyph())
    }
}

/// N セル分の記号を詰めた 64 ビットワード。
///
/// セル番号 i は `0..Profile::CELLS` に限る。範囲外はデバッグビルドで panic し、
/// リリースビルドではシフト量が溢れて結果は不定になる。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Profile(pub u64);

impl Profile {
    /// 全セル BLANK
    pub const EMPTY: Profile = Profile(0);
    /// 1 ワードに入るセル数
    pub const CELLS: usize = 32;

    /// 記号列 (セル 0 から順) をパックする。
    pub fn from_symbols(symbols: &[Symbol]) -> Profile {
        debug_assert!(symbols.len() <= Self::CELLS, "profile holds at most 32 cells");
        symbols
            .iter()
            .enumerate()
            .fold(Profile::EMPTY, |p, (i, &s)| p.with_symbol(i, s))
    }

    /// 下から `len` セル分の記号列を取り出す。
    pub fn symbols(self, len: usize) -> Vec<Symbol> {
        (0..len).map(|i| self.symbol_at(i)).collect()
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn symbol_at(self, i: usize) -> Symbol {
        debug_assert!(i < Self::CELLS, "cell {i} out of range");
        Symbol::from_bits(self.0 >> (2 * i))
    }

    /// セル i, i+1 の窓
    #[inline]
    pub fn pair_at(self, i: usize) -> Pair {
        debug_assert!(i < Self::CELLS, "cell {i} out of range");
        Pair::from_bits(self.0 >> (2 * i))
    }

    #[inline]
    pub fn with_symbol(self, i: usize, symbol: Symbol) -> Profile {
        debug_assert!(i < Self::CELLS, "cell {i} out of range");
        let shift = 2 * i;
        Profile((self.0 & !(SYMBOL_MASK << shift)) | (symbol.bits() << shift))
    }

    #[inline]
    pub fn with_pair(self, i: usize, pair: Pair) -> Profile {
        debug_assert!(i < Self::CELLS, "cell {i} out of range");
        let shift = 2 * i;
        Profile((self.0 & !(PAIR_MASK << shift)) | (pair.bits() << shift))
    }

    /// どこかのセルが BLOCK (11) か
    #[inline]
    pub fn is_blocked(self) -> bool {
        self.0 & (self.0 << 1) & HIGH_BITS != 0
    }

    /// 括弧走査用の符号化。
    ///
    /// BLANK→2, LEFT→1, RIGHT→3 と写すので、符号から 2 を引くと
    /// BLANK = 0, LEFT = −1, RIGHT = +1 の重みになる。
    /// BLOCK を含まないプロファイル上では単射で、LEFT のセルは変わらない。
    #[inline]
    pub fn scan_codes(self) -> Profile {
        let s = self.0;
        Profile(s | ((s & HIGH_BITS) >> 1) | ((!s & LOW_BITS) << 1))
    }

    /// 走査符号の i 番目 (`scan_codes` 済みの値に対して使う)
    #[inline]
    pub(crate) fn code_at(self, i: usize) -> i32 {
        debug_assert!(i < Self::CELLS, "cell {i} out of range");
        ((self.0 >> (2 * i)) & SYMBOL_MASK) as i32
    }

    /// セル i を取り除き、それより上のセルを 1 つ下へ詰める。
    #[inline]
    pub fn drop_cell(self, i: usize) -> Profile {
        let below = (1u64 << (2 * i)) - 1;
        Profile(((self.0 >> 2) & !below) | (self.0 & below))
    }

    /// 下 `cells` セル分
    #[inline]
    pub fn low(self, cells: usize) -> u64 {
        self.0 & ((1u64 << (2 * cells)) - 1)
    }

    /// セル `cells` 以降を下詰めにしたもの
    #[inline]
    pub fn high(self, cells: usize) -> u64 {
        self.0 >> (2 * cells)
    }

    /// 上半分と下半分を連結する。
    #[inline]
    pub fn join(high: u64, low: u64, low_cells: usize) -> Profile {
        Profile((high << (2 * low_cells)) | low)
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 上端のセルから表示する
        let len = (64 - self.0.leading_zeros() as usize).div_ceil(2).max(1);
        let glyphs: String = self.symbols(len).iter().rev().map(|s| s.glyph()).collect();
        write!(f, "Profile({glyphs})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Symbol::*;

    #[test]
    fn test_symbols_round_trip() {
        let cells = [Right, Blank, Left, Left, Blank, Right, Right, Blank];
        let p = Profile::from_symbols(&cells);
        assert_eq!(p.symbols(cells.len()), cells);
        assert_eq!(Profile::from_symbols(&p.symbols(cells.len())), p);
        assert_eq!(p.symbol_at(0), Right);
        assert_eq!(p.symbol_at(2), Left);
        assert_eq!(p.symbol_at(7), Blank);
    }

    #[test]
    fn test_pair_fields() {
        let p = Profile::from_symbols(&[Left, Blank, Right]);
        assert_eq!(p.pair_at(0), Pair::new(Blank, Left));
        assert_eq!(p.pair_at(1), Pair::new(Right, Blank));
        let q = p.with_pair(1, Pair::CLOSING);
        assert_eq!(q.symbols(3), vec![Left, Left, Right]);
        assert_eq!(q.pair_at(1).upper(), Right);
        assert_eq!(q.pair_at(1).lower(), Left);
    }

    #[test]
    fn test_successor_table() {
        assert_eq!(Pair::EMPTY.successor(), Pair::CLOSING);
        assert_eq!(Pair::new(Blank, Left).successor(), Pair::new(Left, Blank));
        assert_eq!(Pair::new(Blank, Right).successor(), Pair::new(Right, Blank));
        assert_eq!(Pair::new(Left, Blank).successor(), Pair::new(Blank, Left));
        assert_eq!(Pair::new(Right, Blank).successor(), Pair::new(Blank, Right));
        assert_eq!(Pair::LEFT_LEFT.successor(), Pair::EMPTY);
        assert_eq!(Pair::RIGHT_RIGHT.successor(), Pair::EMPTY);
        assert_eq!(Pair::new(Left, Right).successor(), Pair::EMPTY);
    }

    #[test]
    fn test_is_blocked() {
        assert!(!Profile::from_symbols(&[Left, Right, Blank, Right]).is_blocked());
        assert!(Profile::from_symbols(&[Left, Block, Blank]).is_blocked());
        assert!(!Profile::EMPTY.is_blocked());
    }

    #[test]
    fn test_scan_codes() {
        let p = Profile::from_symbols(&[Blank, Left, Right, Left]);
        let r = p.scan_codes();
        assert_eq!(r.code_at(0), 2);
        assert_eq!(r.code_at(1), 1);
        assert_eq!(r.code_at(2), 3);
        assert_eq!(r.code_at(3), 1);
        // 未使用の上位セルは BLANK 扱い
        assert_eq!(r.code_at(10), 2);
    }

    #[test]
    fn test_scan_codes_injective_on_small_profiles() {
        let mut seen = std::collections::HashSet::new();
        for s in 0u64..(1 << 12) {
            let p = Profile(s);
            if p.is_blocked() {
                continue;
            }
            assert!(seen.insert(p.scan_codes()), "collision at {p:?}");
        }
    }

    #[test]
    fn test_drop_cell() {
        let p = Profile::from_symbols(&[Left, Right, Left, Right]);
        assert_eq!(p.drop_cell(0).symbols(3), vec![Right, Left, Right]);
        assert_eq!(p.drop_cell(1).symbols(3), vec![Left, Left, Right]);
        assert_eq!(p.drop_cell(3).symbols(4), vec![Left, Right, Left, Blank]);
    }

    #[test]
    fn test_split_and_join() {
        let p = Profile::from_symbols(&[Left, Blank, Right, Left, Right]);
        let (hi, lo) = (p.high(2), p.low(2));
        assert_eq!(Profile::join(hi, lo, 2), p);
        assert_eq!(Profile(lo).symbols(2), vec![Left, Blank]);
        assert_eq!(Profile(hi).symbols(3), vec![Right, Left, Right]);
    }

    #[test]
    fn test_debug_format() {
        let p = Profile::from_symbols(&[Left, Blank, Right]);
        assert_eq!(format!("{p:?}"), "Profile(R.L)");
        assert_eq!(format!("{:?}", Profile::EMPTY), "Profile(.)");
    }

    #[test]
    fn test_top_cell() {
        let p = Profile::EMPTY.with_symbol(31, Right);
        assert_eq!(p.symbol_at(31), Right);
        assert_eq!(p.bits(), 2 << 62);
        assert_eq!(p.pair_at(30), Pair::new(Right, Blank));
        assert_eq!(p.with_pair(30, Pair::EMPTY), Profile::EMPTY);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "out of range")]
    fn test_cell_out_of_range_panics() {
        Profile::EMPTY.symbol_at(Profile::CELLS);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "out of range")]
    fn test_with_symbol_out_of_range_panics() {
        let _ = Profile::EMPTY.with_symbol(40, Left);
    }
}
