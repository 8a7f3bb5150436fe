//! 盤面全体の走査とワーカープールへの振り分け。
//!
//! セルを行ごとに上から下へ (列 N−2 から 0 へ) 1 つずつ進める。
//! 各セルでは空でないグループを固定数のワーカーに配る。ワーカーは
//! `Mutex<usize>` のカウンタから次のグループ番号を取り、なくなったら終わる。
//! プールのスコープが閉じるまで次のセルには進まない。

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::GridConfig;
use crate::counter::{Counter, Counters};
use crate::error::{GridError, Result};
use crate::profile::{Pair, Profile, Symbol};
use crate::space::StateSpace;
use crate::transfer::TransferEngine;

/// 進捗の通知 (セルごと)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1 から数えた行番号
    pub row: usize,
    pub rows: usize,
    /// 行内で何番目のセルか (N − col)
    pub step: usize,
}

/// 数え上げの結果
#[derive(Debug, Clone, Copy)]
pub struct CountOutcome {
    /// 答え mod `modulus` (0..modulus)
    pub residue: u64,
    pub modulus: u64,
    pub elapsed: Duration,
}

/// カウンタ型 `C` を固定した数え上げ器。
///
/// 状態空間・カウンタ配列・ワーカープールを一度だけ用意し、
/// `count` のたびにカウンタをゼロに戻して再利用する。
pub struct GridCounter<C: Counter> {
    config: GridConfig,
    space: StateSpace,
    counters: Counters<C>,
    pool: rayon::ThreadPool,
}

impl<C: Counter> GridCounter<C> {
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        if config.counter_bits != C::BITS {
            return Err(GridError::CounterWidthMismatch {
                configured: config.counter_bits,
                actual: C::BITS,
            });
        }
        let space = StateSpace::build(&config)?;
        let counters = Counters::zeroed(space.main_len(), space.blocked_len())?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.thread_count)
            .thread_name(|i| format!("grid-worker-{i}"))
            .build()?;
        let counter = GridCounter {
            config,
            space,
            counters,
            pool,
        };
        info!(
            n = config.grid_size,
            bits = config.counter_bits,
            threads = config.thread_count,
            memory_bytes = counter.memory_bytes(),
            "counter ready"
        );
        Ok(counter)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn space(&self) -> &StateSpace {
        &self.space
    }

    /// 状態表とカウンタ配列の合計バイト数
    pub fn memory_bytes(&self) -> usize {
        self.space.memory_bytes() + self.counters.memory_bytes()
    }

    /// 法 `modulus` で数える。`progress` はセルを処理する直前に呼ばれる。
    pub fn count(&self, modulus: u64, mut progress: impl FnMut(Progress)) -> Result<CountOutcome> {
        let modulus = self.config.check_modulus(modulus)?;
        let started = Instant::now();
        let n = self.config.grid_size;
        let cycles = self.config.count_cycles;
        let ham = self.config.is_hamiltonian();
        let space = &self.space;
        let main = &self.counters.main;

        self.counters.clear();
        let initial = if cycles {
            Profile::EMPTY
        } else {
            Profile::EMPTY.with_symbol(0, Symbol::Right)
        };
        main.set(space.slot(initial), 1);

        let engine = TransferEngine::new(space, &self.counters, modulus, ham);
        let mut total = 0u64;
        for row in 0..n {
            let row_started = Instant::now();
            for col in (0..n - 1).rev() {
                progress(Progress {
                    row: row + 1,
                    rows: n,
                    step: n - col,
                });
                // セル (row, col) の直前で閉じられるループ
                if cycles && (!ham || (row == n - 1 && col == 0)) {
                    let closing = Profile::EMPTY.with_pair(col, Pair::CLOSING);
                    total = (total + main.get(space.slot(closing))) % modulus;
                }
                self.sweep_cell(&engine, col);
            }
            debug!(row, elapsed_ms = row_started.elapsed().as_millis() as u64, "row finished");
        }

        if !cycles {
            // 右上角に自由端が届いた経路
            let finished = Profile::EMPTY.with_symbol(n - 1, Symbol::Right);
            total = main.get(space.slot(finished)) % modulus;
        }

        let outcome = CountOutcome {
            residue: total,
            modulus,
            elapsed: started.elapsed(),
        };
        info!(
            residue = outcome.residue,
            modulus,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "count finished"
        );
        Ok(outcome)
    }

    /// 1 セル分: 空でないグループをワーカーに配り、全員の終了を待つ。
    fn sweep_cell(&self, engine: &TransferEngine<'_, C>, col: usize) {
        let groups = self.space.nonempty_groups(col);
        let next_task = Mutex::new(0usize);
        let groups = &groups;
        let next_task = &next_task;

        self.pool.scope(|scope| {
            for _ in 0..self.config.thread_count {
                scope.spawn(move |_| loop {
                    let index = {
                        let mut next = next_task.lock().unwrap_or_else(PoisonError::into_inner);
                        let index = *next;
                        *next += 1;
                        index
                    };
                    let Some(&group) = groups.get(index) else {
                        break;
                    };
                    engine.apply_column_step(col, group);
                });
            }
        });
    }
}

/// カウンタ幅を実行時に選ぶ数え上げ器。
pub enum GridRunner {
    U8(GridCounter<u8>),
    U16(GridCounter<u16>),
    U32(GridCounter<u32>),
    U64(GridCounter<u64>),
}

impl GridRunner {
    /// `config.counter_bits` に合うカウンタ型で用意する。
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        match config.counter_bits {
            8 => GridCounter::new(config).map(GridRunner::U8),
            16 => GridCounter::new(config).map(GridRunner::U16),
            32 => GridCounter::new(config).map(GridRunner::U32),
            64 => GridCounter::new(config).map(GridRunner::U64),
            bits => Err(GridError::CounterBits(bits)),
        }
    }

    pub fn memory_bytes(&self) -> usize {
        match self {
            GridRunner::U8(c) => c.memory_bytes(),
            GridRunner::U16(c) => c.memory_bytes(),
            GridRunner::U32(c) => c.memory_bytes(),
            GridRunner::U64(c) => c.memory_bytes(),
        }
    }

    pub fn count(&self, modulus: u64, progress: impl FnMut(Progress)) -> Result<CountOutcome> {
        match self {
            GridRunner::U8(c) => c.count(modulus, progress),
            GridRunner::U16(c) => c.count(modulus, progress),
            GridRunner::U32(c) => c.count(modulus, progress),
            GridRunner::U64(c) => c.count(modulus, progress),
        }
    }
}

/// 設定と法を受け取り、剰余だけを返す。
pub fn count_mod(config: GridConfig, modulus: u64) -> Result<u64> {
    let runner = GridRunner::new(config)?;
    Ok(runner.count(modulus, |_| {})?.residue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CountMode;

    #[test]
    fn test_small_counts() {
        assert_eq!(count_mod(GridConfig::new(2, CountMode::Paths), 97).unwrap(), 2);
        assert_eq!(count_mod(GridConfig::new(2, CountMode::Cycles), 97).unwrap(), 1);
        assert_eq!(count_mod(GridConfig::new(3, CountMode::Paths), 97).unwrap(), 12);
        assert_eq!(count_mod(GridConfig::new(3, CountMode::Cycles), 97).unwrap(), 13);
        assert_eq!(count_mod(GridConfig::new(4, CountMode::Hamiltonian), 97).unwrap(), 6);
    }

    #[test]
    fn test_progress_sequence() {
        let counter = GridCounter::<u64>::new(GridConfig::new(4, CountMode::Paths)).unwrap();
        let mut seen = Vec::new();
        counter.count(1_000_000_007, |p| seen.push(p)).unwrap();
        assert_eq!(seen.len(), 4 * 3);
        assert_eq!(seen[0], Progress { row: 1, rows: 4, step: 2 });
        assert_eq!(seen[2], Progress { row: 1, rows: 4, step: 4 });
        assert_eq!(seen.last().copied(), Some(Progress { row: 4, rows: 4, step: 4 }));
    }

    #[test]
    fn test_counter_is_reusable() {
        let counter = GridCounter::<u32>::new(
            GridConfig::new(4, CountMode::Paths).with_counter_bits(32),
        )
        .unwrap();
        let first = counter.count(1_000_003, |_| {}).unwrap();
        let second = counter.count(1_000_003, |_| {}).unwrap();
        assert_eq!(first.residue, 184);
        assert_eq!(second.residue, 184);
        assert_eq!(counter.count(97, |_| {}).unwrap().residue, 184 % 97);
    }

    #[test]
    fn test_width_mismatch() {
        let config = GridConfig::new(4, CountMode::Paths).with_counter_bits(16);
        assert!(matches!(
            GridCounter::<u8>::new(config),
            Err(GridError::CounterWidthMismatch { configured: 16, actual: 8 })
        ));
    }

    #[test]
    fn test_rejects_modulus_before_counting() {
        let runner = GridRunner::new(GridConfig::new(3, CountMode::Paths).with_counter_bits(8)).unwrap();
        let mut called = false;
        let err = runner.count(256, |_| called = true).unwrap_err();
        assert!(matches!(err, GridError::ModulusOutOfRange { value: 256, max: 255 }));
        assert!(!called);
        assert_eq!(runner.count(255, |_| {}).unwrap().residue, 12);
    }
}
