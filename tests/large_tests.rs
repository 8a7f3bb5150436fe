use grid_path_counter::*;

/// N=6, 7 の既知の値
const PATHS_6: u64 = 1_262_816;
const PATHS_7: u64 = 575_780_564;
const CYCLES_6: u64 = 1_222_363;
const CYCLES_7: u64 = 487_150_371;
const HAMILTONIAN_6: u64 = 1_072;

#[test]
fn test_paths_n6() {
    let config = GridConfig::new(6, CountMode::Paths).with_threads(4);
    assert_eq!(count_mod(config, 1_000_000_007).unwrap(), PATHS_6);
    assert_eq!(count_mod(config, 97).unwrap(), PATHS_6 % 97);
}

#[test]
fn test_cycles_n6() {
    let config = GridConfig::new(6, CountMode::Cycles).with_threads(4);
    assert_eq!(count_mod(config, 1_000_000_007).unwrap(), CYCLES_6);
    assert_eq!(count_mod(config, 97).unwrap(), CYCLES_6 % 97);
}

#[test]
fn test_hamiltonian_n6() {
    let config = GridConfig::new(6, CountMode::Hamiltonian).with_threads(4);
    assert_eq!(count_mod(config, 1_000_000_007).unwrap(), HAMILTONIAN_6);
    assert_eq!(count_mod(config, 97).unwrap(), 5);
    assert_eq!(count_mod(config, 3).unwrap(), 1);
}

#[test]
fn test_n7() {
    let paths = GridConfig::new(7, CountMode::Paths).with_threads(4);
    assert_eq!(count_mod(paths, 1_000_000_007).unwrap(), PATHS_7);
    let cycles = GridConfig::new(7, CountMode::Cycles).with_threads(4);
    assert_eq!(count_mod(cycles, 1_000_000_007).unwrap(), CYCLES_7);
    let ham = GridConfig::new(7, CountMode::Hamiltonian).with_threads(4);
    assert_eq!(count_mod(ham, 1_000_000_007).unwrap(), 0);
}

/// 全カウンタ幅で、その幅の推奨素数に対する剰余が真値と一致する
#[test]
fn test_every_counter_width() {
    for bits in [8u32, 16, 32, 64] {
        let config = GridConfig::new(6, CountMode::Paths)
            .with_counter_bits(bits)
            .with_threads(2);
        let runner = GridRunner::new(config).unwrap();
        for &m in suggested_moduli(bits).iter().take(3) {
            let got = runner.count(m, |_| {}).unwrap().residue;
            assert_eq!(got, PATHS_6 % m, "bits={bits}, mod={m}");
        }
    }
}

#[test]
fn test_thread_count_does_not_change_result() {
    for mode in [CountMode::Paths, CountMode::Cycles, CountMode::Hamiltonian] {
        let single = count_mod(GridConfig::new(6, mode).with_threads(1), 65521).unwrap();
        for threads in [2, 4, 7] {
            let many = count_mod(GridConfig::new(6, mode).with_threads(threads), 65521).unwrap();
            assert_eq!(single, many, "mode={mode:?}, threads={threads}");
        }
    }
}

#[test]
fn test_memory_report() {
    let runner = GridRunner::new(GridConfig::new(8, CountMode::Cycles)).unwrap();
    assert!(runner.memory_bytes() > 0);
    let narrow = GridRunner::new(GridConfig::new(8, CountMode::Cycles).with_counter_bits(8)).unwrap();
    assert!(narrow.memory_bytes() < runner.memory_bytes());
}
