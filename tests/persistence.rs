use evotrader::engines::policy::Policy;
use evotrader::persistence::{IpcPolicyStore, MemoryPolicyStore, PolicyStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("evotrader-store-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_ipc_round_trip_is_exact() {
    let root = scratch("roundtrip");
    let store = IpcPolicyStore::new(&root);
    let mut rng = StdRng::seed_from_u64(2024);
    let mut policy = Policy::random(12, &[9, 5, 4], &mut rng).unwrap();
    policy.mutate(0.5, 0.08, &mut rng);

    store.save("BNBBTC", "3_layers", &policy).unwrap();
    let loaded = store.load("BNBBTC", "3_layers").unwrap().expect("checkpoint should exist");

    assert_eq!(loaded.architecture(), &[9, 5, 4]);
    assert_eq!(loaded.input_size(), 12);
    for (a, b) in policy.weights().iter().zip(loaded.weights()) {
        assert_eq!(a.shape(), b.shape());
        let bits_a: Vec<u64> = a.as_slice().iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u64> = b.as_slice().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }
    assert_eq!(policy, loaded);

    let input = vec![0.25; 12];
    assert_eq!(policy.forward(&input).unwrap(), loaded.forward(&input).unwrap());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_keys_are_independent() {
    let root = scratch("keys");
    let store = IpcPolicyStore::new(&root);
    let mut rng = StdRng::seed_from_u64(1);
    let policy = Policy::random(4, &[3, 3], &mut rng).unwrap();

    store.save("BNBBTC", "2_layers", &policy).unwrap();
    assert!(store.load("BNBBTC", "3_layers").unwrap().is_none());
    assert!(store.load("ETHBTC", "2_layers").unwrap().is_none());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_memory_store() {
    let store = MemoryPolicyStore::new();
    let mut rng = StdRng::seed_from_u64(2);
    let policy = Policy::random(4, &[2], &mut rng).unwrap();

    assert!(store.is_empty());
    store.save("BNBBTC", "1_layers", &policy).unwrap();
    assert_eq!(store.load("BNBBTC", "1_layers").unwrap(), Some(policy));
    assert_eq!(store.len(), 1);
}
