//! 1 セル分の転送 (フロンティアを 1 セル進める更新)。
//!
//! 列 col のセルを処理すると、プロファイルのセル col (下) と col+1 (上) の窓が
//! 置き換わる。窓の組み合わせごとに遷移の種類が決まり、カウントは
//! `main` の別スロットへ流れるか、`blocked` に保留される。
//!
//! 同じ列の異なるグループはスロットが重ならないので、
//! `apply_column_step` は別々のスレッドから同時に呼んでよい。

use crate::counter::{Counter, Counters, Modular};
use crate::merge::replace_right_high;
use crate::profile::{Pair, Profile, Symbol};
use crate::space::StateSpace;

/// 窓 (上, 下) ごとの遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// (BLANK, BLANK): 新しい線分 (RIGHT, LEFT) が始まる
    NewSegment,
    /// 片側だけに端がある。`plug_below` は端が下側 (BLANK, X) のとき真
    CarryThrough { plug_below: bool },
    /// (LEFT, LEFT) または (LEFT, RIGHT)。前者は相手の端の付け替えが要る
    LeftMerge { relabel: bool },
    /// (RIGHT, RIGHT) を上半分の走査で解決する
    RightMergeFast,
    /// (RIGHT, RIGHT) を状態ごとの参照表と走査で解決する
    RightMergeScan,
    /// (RIGHT, LEFT): ループが閉じる。遷移は作らない
    Closing,
}

impl Transition {
    pub fn classify(pair: Pair, col: usize, fast_merge_min_col: usize) -> Transition {
        use Symbol::*;
        match (pair.upper(), pair.lower()) {
            (Blank, Blank) => Transition::NewSegment,
            (Blank, _) => Transition::CarryThrough { plug_below: true },
            (_, Blank) => Transition::CarryThrough { plug_below: false },
            (Left, lower) => Transition::LeftMerge {
                relabel: lower == Left,
            },
            (Right, Right) if col >= fast_merge_min_col => Transition::RightMergeFast,
            (Right, Right) => Transition::RightMergeScan,
            _ => Transition::Closing,
        }
    }
}

/// 共有カウンタ配列に対する転送処理。
pub struct TransferEngine<'a, C: Counter> {
    space: &'a StateSpace,
    counters: &'a Counters<C>,
    modular: Modular,
    hamiltonian: bool,
    fast_merge_min_col: usize,
}

impl<'a, C: Counter> TransferEngine<'a, C> {
    pub fn new(
        space: &'a StateSpace,
        counters: &'a Counters<C>,
        modulus: u64,
        hamiltonian: bool,
    ) -> Self {
        TransferEngine {
            space,
            counters,
            modular: Modular::new(modulus),
            hamiltonian,
            fast_merge_min_col: space.low_cells() + 1,
        }
    }

    /// 列 col のセルを、グループ `group` に属する状態についてだけ処理する。
    ///
    /// 各 (列, グループ) は 1 つのワーカーがちょうど 1 回処理すること。
    pub fn apply_column_step(&self, col: usize, group: u32) {
        if col == 0 {
            self.finish_row(group);
            if self.hamiltonian {
                self.merge_blocked(group);
            }
        } else {
            self.advance(col, group);
        }
    }

    #[inline]
    fn add_main(&self, slot: usize, value: u64) {
        let main = &self.counters.main;
        main.set(slot, self.modular.add(main.get(slot), value));
    }

    #[inline]
    fn add_blocked(&self, slot: usize, value: u64) {
        let blocked = &self.counters.blocked;
        blocked.set(slot, self.modular.add(blocked.get(slot), value));
    }

    /// 保留分を `main` へ戻し、保留を空にする (ハミルトンでは置き換え)。
    #[inline]
    fn absorb(&self, main_slot: usize, blocked_slot: usize) {
        let parked = self.counters.blocked.get(blocked_slot);
        let value = if self.hamiltonian {
            parked
        } else {
            self.modular.add(self.counters.main.get(main_slot), parked)
        };
        self.counters.main.set(main_slot, value);
        self.counters.blocked.set(blocked_slot, 0);
    }

    /// 保留分を `main` へ戻し、元の `main` の値を保留する。
    #[inline]
    fn exchange(&self, main_slot: usize, blocked_slot: usize) {
        let held = self.counters.main.get(main_slot);
        let parked = self.counters.blocked.get(blocked_slot);
        let value = if self.hamiltonian {
            parked
        } else {
            self.modular.add(held, parked)
        };
        self.counters.main.set(main_slot, value);
        self.counters.blocked.set(blocked_slot, held);
    }

    /// 区間 [at, at+len) のカウントを、`parked` 状態から始まる保留スロットへ加える。
    #[inline]
    fn park_run(&self, parked: Profile, at: usize, len: usize) {
        let base = self.space.slot(parked);
        for k in 0..len {
            self.add_blocked(base + k, self.counters.main.get(at + k));
        }
    }

    /// 列 1 以上の一般の更新
    fn advance(&self, col: usize, group: u32) {
        let space = self.space;
        let main = &self.counters.main;
        let ham = self.hamiltonian;
        let cell = col.min(space.low_cells() - 1);
        let drop = col + 1;

        for &j in space.group_members(col, group) {
            let high = space.high_profile(j);
            let bucket = space.high_bucket(j);
            let runs = space.runs(cell, bucket);
            let Some(head) = runs.first() else {
                continue;
            };
            let start = space.slot(Profile(high.0 | head.first as u64));
            let mut next_slot = start;

            for run in runs {
                let at = next_slot;
                let len = run.len as usize;
                next_slot += len;

                let lead = main.get(at);
                if !ham && lead == 0 {
                    continue;
                }
                let state = Profile(high.0 | run.first as u64);
                let pair = state.pair_at(col);
                if ham && len == 1 && lead == 0 && pair.upper() != Symbol::Blank {
                    continue;
                }
                let next = state.with_pair(col, pair.successor());

                match Transition::classify(pair, col, self.fast_merge_min_col) {
                    Transition::NewSegment => {
                        let target = space.slot(next);
                        let parked = space.slot(state.drop_cell(drop));
                        for k in 0..len {
                            self.add_main(target + k, main.get(at + k));
                            self.absorb(at + k, parked + k);
                        }
                    }
                    Transition::CarryThrough { plug_below: true } => {
                        let parked = space.slot(state.drop_cell(drop));
                        for k in 0..len {
                            self.exchange(at + k, parked + k);
                        }
                    }
                    Transition::CarryThrough { plug_below: false } => {
                        let target = space.slot(next);
                        for k in 0..len {
                            self.add_main(target + k, main.get(at + k));
                        }
                    }
                    Transition::LeftMerge { relabel } => {
                        let merged = if relabel {
                            match space.merge().replace_left(next, col) {
                                Some(p) => p,
                                None => continue,
                            }
                        } else {
                            next
                        };
                        self.park_run(merged.drop_cell(drop), at, len);
                    }
                    Transition::RightMergeFast => {
                        match replace_right_high(next, col, space.low_cells()) {
                            Some(merged) => self.park_run(merged.drop_cell(drop), at, len),
                            None => self.right_merge_scan(high, bucket, at - start, at, len, col),
                        }
                    }
                    Transition::RightMergeScan => {
                        self.right_merge_scan(high, bucket, at - start, at, len, col)
                    }
                    Transition::Closing => {}
                }
            }
        }
    }

    /// (RIGHT, RIGHT) の区間を 1 状態ずつ処理する。
    ///
    /// 相手の LEFT が区間内で異なる位置にあり得るので、まとめて送れない。
    fn right_merge_scan(
        &self,
        high: Profile,
        bucket: usize,
        rank: usize,
        at: usize,
        len: usize,
        col: usize,
    ) {
        let space = self.space;
        let lows = &space.low_states(bucket)[rank..rank + len];
        for (k, &lo) in lows.iter().enumerate() {
            let value = self.counters.main.get(at + k);
            if value == 0 {
                continue;
            }
            let state = Profile(high.0 | lo as u64);
            let cleared = state.with_pair(col, state.pair_at(col).successor());
            // 相手が見つからない結合は数えない
            if let Some(merged) = space.merge().replace_right(cleared, col) {
                self.add_blocked(space.slot(merged.drop_cell(col + 1)), value);
            }
        }
    }

    /// 列 0 (行の終端) の更新。
    ///
    /// 窓 (セル 1, セル 0) を状態ごとに明示的なスロット参照で解決する。
    /// (X, BLANK) は対になる (BLANK, X) の処理でまとめて扱う。
    fn finish_row(&self, group: u32) {
        let space = self.space;
        let main = &self.counters.main;
        let ham = self.hamiltonian;

        for &j in space.group_members(0, group) {
            let high = space.high_profile(j);
            for &lo in space.low_states(space.high_bucket(j)) {
                let state = Profile(high.0 | lo as u64);
                let at = space.slot(state);
                let value = main.get(at);
                let pair = state.pair_at(0);
                let transition = Transition::classify(pair, 0, usize::MAX);

                match transition {
                    Transition::CarryThrough { plug_below: false } => continue,
                    Transition::NewSegment if !ham && value == 0 => {
                        self.absorb(at, space.slot(state.drop_cell(0)));
                        continue;
                    }
                    Transition::CarryThrough { plug_below: true } => {
                        let twin = state.with_pair(0, Pair::new(pair.lower(), Symbol::Blank));
                        let twin_at = space.slot(twin);
                        let parked = space.slot(twin.drop_cell(0));
                        self.exchange(at, parked);
                        self.add_main(at, main.get(twin_at));
                        if !ham {
                            self.absorb(twin_at, parked);
                        }
                        continue;
                    }
                    _ => {}
                }

                if value == 0 && (!ham || pair.upper() != Symbol::Blank) {
                    continue;
                }
                match transition {
                    Transition::NewSegment => {
                        let target = space.slot(state.with_pair(0, pair.successor()));
                        self.add_main(target, value);
                        self.absorb(at, space.slot(state.drop_cell(0)));
                    }
                    Transition::LeftMerge { relabel } => {
                        let mut merged = state.with_pair(0, pair.successor());
                        if relabel {
                            match space.merge().replace_left(merged, 0) {
                                Some(p) => merged = p,
                                None => continue,
                            }
                        }
                        let parked = space.slot(merged.drop_cell(0));
                        self.add_blocked(parked, value);
                        if !ham {
                            self.absorb(space.slot(merged), parked);
                        }
                    }
                    // セル 0 の下にはもうセルがない
                    _ => {}
                }
            }
        }
    }

    /// ハミルトンモードの行末処理。
    ///
    /// セル 0 が BLANK の状態は、保留していた飽和済みのカウントで置き換える。
    fn merge_blocked(&self, group: u32) {
        let space = self.space;
        for &j in space.group_members(0, group) {
            let high = space.high_profile(j);
            for &lo in space.low_states(space.high_bucket(j)) {
                let state = Profile(high.0 | lo as u64);
                if state.symbol_at(0) == Symbol::Blank {
                    self.absorb(space.slot(state), space.slot(state.drop_cell(0)));
                }
            }
        }
    }
}
