#![no_main]
use libfuzzer_sys::fuzz_target;
use perffuzz_metrics::Seed;
use perffuzz_seedpool::{PoolConfig, SeedPool};

// The pool must never panic regardless of corpus/mutation shape: duplicate
// artifacts, an empty initial corpus, selecting from an empty pool, and
// decrementing a seed that was already evicted. Data is read as a sequence
// of 2-byte opcodes: tag byte selects add/select/decrement, payload byte is
// reused as seed bytes for `add`.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let corpus_len = (data[0] % 8) as usize;
    let initial: Vec<Seed> = data[1..]
        .chunks(4)
        .take(corpus_len)
        .enumerate()
        .map(|(i, chunk)| Seed::initial(chunk.to_vec(), format!("seed-{i}"), "fuzz", 10))
        .collect();

    let rng_seed = u64::from(data[0]).wrapping_mul(0x9E37_79B9);
    let mut pool = SeedPool::new(initial, PoolConfig::default(), rng_seed);

    for op in data.chunks(2).take(256) {
        let &[tag, payload] = op else { continue };
        match tag % 3 {
            0 => {
                let seed = Seed::initial(vec![payload; 3], "child", "fuzz", 5);
                let _ = pool.add(seed);
            }
            1 => {
                if let Some(id) = pool.select() {
                    let _ = pool.get(id);
                }
            }
            _ => {
                let next_id = pool.iter().next().map(Seed::id);
                if let Some(id) = next_id {
                    pool.decrement(id);
                }
            }
        }
    }
});
