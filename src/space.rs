//! 到達可能な状態の列挙とアドレス表。
//!
//! プロファイルを下半分 (⌊N/2⌋ セル) と上半分 (⌈N/2⌉ セル) に分け、
//! それぞれで括弧対応が崩れていない「釣り合った」半状態だけを列挙する。
//! 上半分の状態が要求する下半分のバケット (RIGHT と LEFT の差) ごとに
//! 下半分を密に並べるので、状態のスロットは
//!
//!   slot = high_index[上半分] + low_index[下半分]
//!
//! の 1 回の足し算で求まる。

use tracing::debug;

use crate::config::GridConfig;
use crate::error::{try_alloc, try_push, Result};
use crate::merge::MergeTables;
use crate::profile::{Pair, Profile, Symbol};

/// 下位 `cells` セルを固定した連続区間。
///
/// 同じバケット内で、列位置 i より上のセルが等しい下半状態は連続して並ぶ。
/// `first` は区間先頭の下半状態、`len` は区間の長さ。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub first: u32,
    pub len: u32,
}

/// 走査符号の 2 を引いた重み: BLANK 0, LEFT −1, RIGHT +1
#[inline]
fn weight(codes: Profile, i: usize) -> i32 {
    codes.code_at(i) - 2
}

/// 下半分として有効か。
///
/// 下から見て、どの RIGHT にも下側に対応する LEFT がある
/// (パスモードでは対応のない RIGHT を 1 個まで許す)。
pub fn is_balanced_low(state: u64, cells: usize, cycles: bool) -> bool {
    let p = Profile(state);
    if p.is_blocked() {
        return false;
    }
    let codes = p.scan_codes();
    let mut depth = if cycles { 1 } else { 2 };
    for i in 0..cells {
        depth -= weight(codes, i);
        if depth == 0 {
            return false;
        }
    }
    true
}

/// 上半分として有効か。
///
/// 上から見て、どの LEFT にも上側に対応する RIGHT がある。
pub fn is_balanced_high(state: u64, cells: usize) -> bool {
    let p = Profile(state);
    if p.is_blocked() {
        return false;
    }
    let codes = p.scan_codes();
    let mut depth = 1;
    for i in (0..cells).rev() {
        depth += weight(codes, i);
        if depth == 0 {
            return false;
        }
    }
    true
}

/// RIGHT の個数 − LEFT の個数
pub fn plug_balance(state: u64, cells: usize) -> i32 {
    let codes = Profile(state).scan_codes();
    (0..cells).map(|i| weight(codes, i)).sum()
}

/// BLANK でないセルのビットマスク
fn occupancy(state: u64, cells: usize) -> u32 {
    let p = Profile(state);
    (0..cells)
        .filter(|&i| p.symbol_at(i) != Symbol::Blank)
        .fold(0, |mask, i| mask | (1 << i))
}

/// 列挙済みの状態空間と、そのアドレス表・実行区間・グループ分割。
pub struct StateSpace {
    grid_size: usize,
    low_cells: usize,
    high_cells: usize,
    high_states: Vec<u32>,
    high_buckets: Vec<u8>,
    low_buckets: Vec<Vec<u32>>,
    low_index: Vec<u32>,
    high_index: Vec<usize>,
    /// runs[列位置][バケット]
    runs: Vec<Vec<Vec<Run>>>,
    /// groups[グループバケット][グループ ID] → 上半状態の番号 (昇順)
    groups: Vec<Vec<Vec<u32>>>,
    main_len: usize,
    blocked_len: usize,
    merge: MergeTables,
}

impl StateSpace {
    /// 全表を構築する (単一スレッド、計算前に 1 回)。
    pub fn build(config: &GridConfig) -> Result<Self> {
        config.validate()?;
        let low_cells = config.low_cells();
        let high_cells = config.high_cells();
        let cycles = config.count_cycles;
        let bucket_count = low_cells + 2;

        // 1. 上半分の列挙とバケット
        let mut high_states: Vec<u32> = Vec::new();
        let mut high_buckets: Vec<u8> = Vec::new();
        for h in 0..1u64 << (2 * high_cells) {
            if is_balanced_high(h, high_cells) {
                try_push(&mut high_states, h as u32, "high states")?;
                try_push(&mut high_buckets, plug_balance(h, high_cells) as u8, "high states")?;
            }
        }

        // 2. 下半分をバケットへ (昇順のまま)
        let path_offset = if cycles { 0 } else { 1 };
        let mut low_buckets: Vec<Vec<u32>> = try_alloc(bucket_count, "low states", Vec::new)?;
        for lo in 0..1u64 << (2 * low_cells) {
            if is_balanced_low(lo, low_cells, cycles) {
                let bucket = path_offset - plug_balance(lo, low_cells);
                try_push(&mut low_buckets[bucket as usize], lo as u32, "low states")?;
            }
        }

        // 3. アドレス表
        let mut low_index = try_alloc(1usize << (2 * low_cells), "low index", || 0u32)?;
        for bucket in &low_buckets {
            for (rank, &lo) in bucket.iter().enumerate() {
                low_index[lo as usize] = rank as u32;
            }
        }
        let high_space = 1usize << (2 * high_cells);
        let mut high_index = try_alloc(high_space, "high index", || 0usize)?;
        let mut offset = 0usize;
        let mut blocked_len = 0usize;
        for (&h, &bucket) in high_states.iter().zip(&high_buckets) {
            high_index[h as usize] = offset;
            offset += low_buckets[bucket as usize].len();
            // 最上セルが BLANK の状態までが blocked 配列の範囲
            if (h as usize) < high_space / 4 {
                blocked_len = offset;
            }
        }
        let main_len = offset;

        // 4. 列位置ごとの実行区間
        let mut runs: Vec<Vec<Vec<Run>>> = try_alloc(low_cells, "run views", Vec::new)?;
        for (i, by_bucket) in runs.iter_mut().enumerate() {
            *by_bucket = try_alloc(bucket_count, "run views", Vec::new)?;
            for (runs_of, bucket) in by_bucket.iter_mut().zip(&low_buckets) {
                *runs_of = split_runs(bucket, i)?;
            }
        }

        // 5. グループ分割
        let group_count = 1usize << high_cells;
        let mut groups: Vec<Vec<Vec<u32>>> = try_alloc(high_cells, "group partition", Vec::new)?;
        for (i, by_group) in groups.iter_mut().enumerate() {
            *by_group = try_alloc(group_count, "group partition", Vec::new)?;
            for (j, &h) in high_states.iter().enumerate() {
                let cut = Profile(h as u64).with_pair(i, Pair::EMPTY).0;
                let group = occupancy(cut, high_cells) as usize;
                try_push(&mut by_group[group], j as u32, "group partition")?;
            }
        }

        let merge = MergeTables::build()?;

        let space = StateSpace {
            grid_size: config.grid_size,
            low_cells,
            high_cells,
            high_states,
            high_buckets,
            low_buckets,
            low_index,
            high_index,
            runs,
            groups,
            main_len,
            blocked_len,
            merge,
        };
        debug!(
            n = space.grid_size,
            high_states = space.high_states.len(),
            low_states = space.low_state_count(),
            main = space.main_len,
            blocked = space.blocked_len,
            "state space enumerated"
        );
        Ok(space)
    }

    #[inline]
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    #[inline]
    pub fn low_cells(&self) -> usize {
        self.low_cells
    }

    #[inline]
    pub fn high_cells(&self) -> usize {
        self.high_cells
    }

    /// 状態のスロット番号。`state` は列挙済みの有効な状態であること。
    #[inline]
    pub fn slot(&self, state: Profile) -> usize {
        self.low_index[state.low(self.low_cells) as usize] as usize
            + self.high_index[state.high(self.low_cells) as usize]
    }

    #[inline]
    pub fn main_len(&self) -> usize {
        self.main_len
    }

    #[inline]
    pub fn blocked_len(&self) -> usize {
        self.blocked_len
    }

    #[inline]
    pub fn merge(&self) -> &MergeTables {
        &self.merge
    }

    pub fn high_state_count(&self) -> usize {
        self.high_states.len()
    }

    pub fn low_state_count(&self) -> usize {
        self.low_buckets.iter().map(Vec::len).sum()
    }

    /// j 番目の上半状態を上位セル位置へ配置したもの
    #[inline]
    pub fn high_profile(&self, j: u32) -> Profile {
        Profile::join(self.high_states[j as usize] as u64, 0, self.low_cells)
    }

    /// j 番目の上半状態が要求する下半バケット
    #[inline]
    pub fn high_bucket(&self, j: u32) -> usize {
        self.high_buckets[j as usize] as usize
    }

    #[inline]
    pub fn low_states(&self, bucket: usize) -> &[u32] {
        &self.low_buckets[bucket]
    }

    pub fn high_states(&self) -> &[u32] {
        &self.high_states
    }

    /// 列位置 `cell` (< 下半セル数) で区切った実行区間
    #[inline]
    pub fn runs(&self, cell: usize, bucket: usize) -> &[Run] {
        &self.runs[cell][bucket]
    }

    /// 列 col の処理で使うグループ分割の番号
    #[inline]
    pub fn group_bucket(&self, col: usize) -> usize {
        col.saturating_sub(self.low_cells)
    }

    pub fn group_count(&self) -> usize {
        1 << self.high_cells
    }

    #[inline]
    pub fn group_members(&self, col: usize, group: u32) -> &[u32] {
        &self.groups[self.group_bucket(col)][group as usize]
    }

    /// 列 col で空でないグループ ID (降順)
    pub fn nonempty_groups(&self, col: usize) -> Vec<u32> {
        let by_group = &self.groups[self.group_bucket(col)];
        (0..by_group.len() as u32)
            .rev()
            .filter(|&g| !by_group[g as usize].is_empty())
            .collect()
    }

    /// 全状態をスロット順に列挙する。
    pub fn states(&self) -> impl Iterator<Item = Profile> + '_ {
        (0..self.high_states.len() as u32).flat_map(move |j| {
            let high = self.high_profile(j);
            self.low_states(self.high_bucket(j))
                .iter()
                .map(move |&lo| Profile(high.0 | lo as u64))
        })
    }

    /// 表とグループ分割が占めるバイト数 (カウンタ配列を除く)
    pub fn memory_bytes(&self) -> usize {
        use std::mem::size_of;
        let runs: usize = self
            .runs
            .iter()
            .flatten()
            .map(|r| r.len() * size_of::<Run>())
            .sum();
        let groups: usize = self
            .groups
            .iter()
            .flatten()
            .map(|g| g.len() * size_of::<u32>())
            .sum();
        self.high_states.len() * (size_of::<u32>() + size_of::<u8>())
            + self.low_state_count() * size_of::<u32>()
            + self.low_index.len() * size_of::<u32>()
            + self.high_index.len() * size_of::<usize>()
            + runs
            + groups
            + self.merge.memory_bytes()
    }
}

/// セル `cell` より上が等しい極大区間に分ける。
fn split_runs(bucket: &[u32], cell: usize) -> Result<Vec<Run>> {
    let shift = 2 * cell;
    let mut runs: Vec<Run> = Vec::new();
    for &lo in bucket {
        match runs.last_mut() {
            Some(run) if run.first >> shift == lo >> shift => run.len += 1,
            _ => try_push(&mut runs, Run { first: lo, len: 1 }, "run views")?,
        }
    }
    Ok(runs)
}
