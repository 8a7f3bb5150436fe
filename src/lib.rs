//! N×N 格子グラフ上の経路・閉路の剰余数え上げ
//!
//! 角から角への単純パス、単純閉路、ハミルトン閉路の数を、任意の法 m で求める。
//! 格子を 1 セルずつ走査する転送行列法 (フロンティア DP) で、
//! フロンティアの状態は 1 セル 2 ビットのプロファイルとして 64 ビットワードに詰める。
//!
//! 盤面サイズ・モード・カウンタ幅・スレッド数はビルド時に固定する (`build.rs`)。

pub mod config;
pub mod counter;
pub mod error;
pub mod merge;
pub mod profile;
pub mod reference;
pub mod scheduler;
pub mod space;
pub mod transfer;

pub use config::{max_modulus, suggested_moduli, CountMode, GridConfig, MAX_GRID_SIZE, MIN_GRID_SIZE};
pub use counter::{Counter, CounterArray, Counters, Modular};
pub use error::{GridError, Result};
pub use merge::{replace_right_high, MergeTables};
pub use profile::{Pair, Profile, Symbol};
pub use reference::{count_cycles_exact, count_paths_exact, reference_count, reference_half_states, reference_residue, Half};
pub use scheduler::{count_mod, CountOutcome, GridCounter, GridRunner, Progress};
pub use space::{is_balanced_high, is_balanced_low, plug_balance, Run, StateSpace};
pub use transfer::{Transition, TransferEngine};
