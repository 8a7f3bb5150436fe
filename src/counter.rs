//! 剰余カウンタの保存領域。
//!
//! カウンタ幅 (8/16/32/64 ビット) は `Counter` を実装する整数型で選ぶ。
//! 配列は要素ごとのアトミックで、並列ワーカーが互いに素なスロットへ
//! ロックなしで読み書きする。順序付けは列ごとの合流 (スコープ終了) が担うので
//! 個々のアクセスは `Relaxed` でよい。

use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::error::{try_alloc, Result};

/// カウンタ語の型。
pub trait Counter: Copy + Send + Sync + 'static {
    /// 共有配列の 1 要素
    type Cell: Send + Sync;
    const BITS: u32;

    fn zero() -> Self::Cell;
    fn load(cell: &Self::Cell) -> u64;
    /// `value` はカウンタ幅に収まっていること (法の上限で保証される)
    fn store(cell: &Self::Cell, value: u64);
}

macro_rules! impl_counter {
    ($int:ty, $atomic:ty) => {
        impl Counter for $int {
            type Cell = $atomic;
            const BITS: u32 = <$int>::BITS;

            #[inline]
            fn zero() -> $atomic {
                <$atomic>::new(0)
            }

            #[inline]
            fn load(cell: &$atomic) -> u64 {
                cell.load(Ordering::Relaxed) as u64
            }

            #[inline]
            fn store(cell: &$atomic, value: u64) {
                cell.store(value as $int, Ordering::Relaxed)
            }
        }
    };
}

impl_counter!(u8, AtomicU8);
impl_counter!(u16, AtomicU16);
impl_counter!(u32, AtomicU32);
impl_counter!(u64, AtomicU64);

/// 共有カウンタ配列
pub struct CounterArray<C: Counter> {
    cells: Vec<C::Cell>,
}

impl<C: Counter> CounterArray<C> {
    /// ゼロ初期化した配列を確保する。
    pub fn zeroed(len: usize, what: &'static str) -> Result<Self> {
        Ok(CounterArray {
            cells: try_alloc(len, what, C::zero)?,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> u64 {
        C::load(&self.cells[slot])
    }

    #[inline]
    pub fn set(&self, slot: usize, value: u64) {
        C::store(&self.cells[slot], value)
    }

    pub fn clear(&self) {
        for cell in &self.cells {
            C::store(cell, 0);
        }
    }

    pub fn memory_bytes(&self) -> usize {
        self.cells.len() * std::mem::size_of::<C::Cell>()
    }

    /// 現在値の複製 (診断・テスト用)
    pub fn snapshot(&self) -> Vec<u64> {
        self.cells.iter().map(C::load).collect()
    }

    /// `snapshot` で取った値を書き戻す。
    pub fn restore(&self, values: &[u64]) {
        assert_eq!(values.len(), self.cells.len(), "snapshot length mismatch");
        for (cell, &v) in self.cells.iter().zip(values) {
            C::store(cell, v);
        }
    }
}

/// 2 本のカウンタ配列。
///
/// - `main`: 確定した状態ごとの剰余カウント
/// - `blocked`: 飽和した頂点を含む保留中のカウント (上側セルを取り除いた状態で引く)
pub struct Counters<C: Counter> {
    pub main: CounterArray<C>,
    pub blocked: CounterArray<C>,
}

impl<C: Counter> Counters<C> {
    pub fn zeroed(main_len: usize, blocked_len: usize) -> Result<Self> {
        Ok(Counters {
            main: CounterArray::zeroed(main_len, "main counters")?,
            blocked: CounterArray::zeroed(blocked_len, "blocked counters")?,
        })
    }

    pub fn clear(&self) {
        self.main.clear();
        self.blocked.clear();
    }

    pub fn memory_bytes(&self) -> usize {
        self.main.memory_bytes() + self.blocked.memory_bytes()
    }
}

/// 法 m の加算。
///
/// カウンタは [0, m] に保つ。a + b > m のときだけ m を引くので、
/// 値 0 は「到達しない状態」を、値 m は「到達するが m の倍数」を表す。
/// 転送処理の 0 スキップはこの区別に依存している。
#[derive(Debug, Clone, Copy)]
pub struct Modular {
    modulus: u64,
}

impl Modular {
    pub fn new(modulus: u64) -> Self {
        Modular { modulus }
    }

    #[inline]
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        let x = a + b;
        if x > self.modulus {
            x - self.modulus
        } else {
            x
        }
    }

    /// 真の剰余 (0..m) へ正規化する。
    #[inline]
    pub fn reduce(&self, a: u64) -> u64 {
        a % self.modulus
    }
}
