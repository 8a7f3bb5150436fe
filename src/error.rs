//! エラー型。

use crate::config::{MAX_GRID_SIZE, MIN_GRID_SIZE};

/// 設定・入力・資源確保の失敗。
///
/// いずれもバイナリでは 1 行のメッセージとして表示され、終了コード 1 になる。
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// 法がカウンタ幅の範囲 [2, max] に収まらない
    #[error("mod must be in range [2, {max}], got {value}")]
    ModulusOutOfRange { value: u64, max: u64 },

    /// 法の文字列が正の整数として解釈できない
    #[error("mod must be a positive integer, got {0:?}")]
    ModulusParse(String),

    #[error("grid size must be in range [{min}, {max}], got {0}", min = MIN_GRID_SIZE, max = MAX_GRID_SIZE)]
    GridSize(usize),

    #[error("counter width must be 8, 16, 32 or 64 bits, got {0}")]
    CounterBits(u32),

    /// 設定のカウンタ幅と実際のカウンタ型が一致しない
    #[error("configured counter width is {configured} bits but the counter type has {actual} bits")]
    CounterWidthMismatch { configured: u32, actual: u32 },

    #[error("thread count must be at least 1")]
    ThreadCount,

    /// ハミルトン指定なのにサイクルモードでない
    #[error("hamiltonian counting requires cycle mode")]
    HamiltonianWithoutCycles,

    /// 状態表またはカウンタ配列の確保に失敗
    #[error("failed to allocate {what} ({bytes} bytes)")]
    Allocation { what: &'static str, bytes: usize },

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, GridError>;

/// `len` 要素の Vec を確保し、`fill` で埋める。
///
/// 確保に失敗した場合はアボートせずに `GridError::Allocation` を返す。
pub(crate) fn try_alloc<T>(len: usize, what: &'static str, fill: impl FnMut() -> T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| GridError::Allocation {
        what,
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    buf.resize_with(len, fill);
    Ok(buf)
}

/// 1 要素追加する。伸長の確保に失敗したら `GridError::Allocation` を返す。
pub(crate) fn try_push<T>(buf: &mut Vec<T>, item: T, what: &'static str) -> Result<()> {
    buf.try_reserve(1).map_err(|_| GridError::Allocation {
        what,
        bytes: buf.len().saturating_add(1).saturating_mul(std::mem::size_of::<T>()),
    })?;
    buf.push(item);
    Ok(())
}
