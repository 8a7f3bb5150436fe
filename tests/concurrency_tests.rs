//! 同じ列のグループが互いに素なスロットだけを触ることの確認。

use grid_path_counter::*;

const MODULUS: u64 = 1_000_000_007;

struct Snapshot {
    main: Vec<u64>,
    blocked: Vec<u64>,
}

fn snapshot(counters: &Counters<u64>) -> Snapshot {
    Snapshot {
        main: counters.main.snapshot(),
        blocked: counters.blocked.snapshot(),
    }
}

fn restore(counters: &Counters<u64>, s: &Snapshot) {
    counters.main.restore(&s.main);
    counters.blocked.restore(&s.blocked);
}

/// 変化したスロットの所有グループを記録し、重なりがあれば失敗する
fn claim(owner: &mut [Option<u32>], before: &[u64], after: &[u64], group: u32, what: &str) {
    for (slot, (b, a)) in before.iter().zip(after).enumerate() {
        if b != a {
            if let Some(other) = owner[slot] {
                panic!("{what} slot {slot} written by groups {other} and {group}");
            }
            owner[slot] = Some(group);
        }
    }
}

/// 全セルについて、グループを 1 つずつ単独で適用した差分が
/// 互いに重ならず、合成すると通常の走査結果に一致することを確かめる
fn check_groups_are_independent(n: usize, mode: CountMode) {
    let config = GridConfig::new(n, mode);
    let space = StateSpace::build(&config).unwrap();
    let counters = Counters::<u64>::zeroed(space.main_len(), space.blocked_len()).unwrap();
    let initial = if config.count_cycles {
        Profile::EMPTY
    } else {
        Profile::EMPTY.with_symbol(0, Symbol::Right)
    };
    counters.main.set(space.slot(initial), 1);
    let engine = TransferEngine::new(&space, &counters, MODULUS, config.is_hamiltonian());

    for row in 0..n {
        for col in (0..n - 1).rev() {
            let groups = space.nonempty_groups(col);
            let base = snapshot(&counters);

            let mut main_owner = vec![None; base.main.len()];
            let mut blocked_owner = vec![None; base.blocked.len()];
            let mut merged = Snapshot {
                main: base.main.clone(),
                blocked: base.blocked.clone(),
            };
            for &g in &groups {
                restore(&counters, &base);
                engine.apply_column_step(col, g);
                let alone = snapshot(&counters);
                claim(&mut main_owner, &base.main, &alone.main, g, "main");
                claim(&mut blocked_owner, &base.blocked, &alone.blocked, g, "blocked");
                for (slot, owner) in main_owner.iter().enumerate() {
                    if *owner == Some(g) {
                        merged.main[slot] = alone.main[slot];
                    }
                }
                for (slot, owner) in blocked_owner.iter().enumerate() {
                    if *owner == Some(g) {
                        merged.blocked[slot] = alone.blocked[slot];
                    }
                }
            }

            // 逆順に適用しても同じ
            restore(&counters, &base);
            for &g in groups.iter().rev() {
                engine.apply_column_step(col, g);
            }
            let reversed = snapshot(&counters);

            // 通常の順序 (降順) で進めて次のセルへ
            restore(&counters, &base);
            for &g in &groups {
                engine.apply_column_step(col, g);
            }
            let forward = snapshot(&counters);

            let at = format!("n={n}, mode={mode:?}, row={row}, col={col}");
            assert_eq!(forward.main, reversed.main, "{at}");
            assert_eq!(forward.blocked, reversed.blocked, "{at}");
            assert_eq!(forward.main, merged.main, "{at}");
            assert_eq!(forward.blocked, merged.blocked, "{at}");
        }
    }
}

#[test]
fn test_groups_independent_paths() {
    for n in 2..=6 {
        check_groups_are_independent(n, CountMode::Paths);
    }
}

#[test]
fn test_groups_independent_cycles() {
    for n in 2..=6 {
        check_groups_are_independent(n, CountMode::Cycles);
    }
}

#[test]
fn test_groups_independent_hamiltonian() {
    for n in 2..=6 {
        check_groups_are_independent(n, CountMode::Hamiltonian);
    }
}

/// 8 ワーカーでも 1 ワーカーと同じ剰余になる
#[test]
fn test_parallel_sweep_matches_sequential() {
    let modulus = 65521;
    for mode in [CountMode::Paths, CountMode::Cycles, CountMode::Hamiltonian] {
        let sequential = GridCounter::<u32>::new(
            GridConfig::new(7, mode).with_counter_bits(32).with_threads(1),
        )
        .unwrap();
        let parallel = GridCounter::<u32>::new(
            GridConfig::new(7, mode).with_counter_bits(32).with_threads(8),
        )
        .unwrap();
        let a = sequential.count(modulus, |_| {}).unwrap();
        let b = parallel.count(modulus, |_| {}).unwrap();
        assert_eq!(a.residue, b.residue, "mode={mode:?}");
    }
}
