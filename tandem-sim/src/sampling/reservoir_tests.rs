use super::ReservoirSampler;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Chi-squared statistic for observed counts against expected proportions
fn chi_squared_test(observed: &[u32], expected: &[f64], total_samples: u32) -> f64 {
    let mut chi_squared = 0.0;

    for (i, &obs) in observed.iter().enumerate() {
        let exp = expected[i] * total_samples as f64;
        if exp > 0.0 {
            let diff = obs as f64 - exp;
            chi_squared += (diff * diff) / exp;
        }
    }

    chi_squared
}

#[test]
fn test_inclusion_probability_large_stream() {
    // N = 100000 tagged items into k = 100 slots; tags grouped into 100
    // buckets of 1000 so each bucket expects k / 100 hits per trial
    let n: usize = 100_000;
    let k: usize = 100;
    let buckets: usize = 100;
    let num_trials: u32 = 200;

    let mut rng = StdRng::seed_from_u64(2024);
    let mut counts = vec![0u32; buckets];

    for _ in 0..num_trials {
        let mut sampler = ReservoirSampler::new(k);
        for tag in 0..n {
            sampler.add(tag, &mut rng);
        }
        for &tag in sampler.items() {
            counts[tag / (n / buckets)] += 1;
        }
    }

    let expected = vec![1.0 / buckets as f64; buckets];
    let chi_squared = chi_squared_test(&counts, &expected, num_trials * k as u32);

    // df = 99; critical value at alpha = 0.05 is about 123.2
    assert!(
        chi_squared < 150.0,
        "Chi-squared value {} exceeds threshold, suggesting non-uniform inclusion",
        chi_squared
    );
}

#[test]
fn test_inclusion_probability_per_item() {
    let n: usize = 1000;
    let k: usize = 100;
    let num_trials: u32 = 2000;

    let mut rng = StdRng::seed_from_u64(99099);
    let mut counts = vec![0u32; n];

    for _ in 0..num_trials {
        let mut sampler = ReservoirSampler::new(k);
        for tag in 0..n {
            sampler.add(tag, &mut rng);
        }
        for &tag in sampler.items() {
            counts[tag] += 1;
        }
    }

    // each item lands in the reservoir with probability k / n
    let expected = vec![k as f64 / n as f64; n];
    let chi_squared = chi_squared_test(&counts, &expected, num_trials);

    // df = 999, standard deviation about 45
    assert!(
        chi_squared < 1200.0,
        "Chi-squared value {} exceeds threshold, suggesting non-uniform inclusion",
        chi_squared
    );

    let first_half: u32 = counts[..n / 2].iter().sum();
    let second_half: u32 = counts[n / 2..].iter().sum();
    let ratio = first_half as f64 / second_half as f64;
    assert!((0.9..1.1).contains(&ratio), "early/late ratio {}", ratio);
}

#[test]
fn test_draw_is_uniform_over_reservoir() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut sampler = ReservoirSampler::new(10);
    for tag in 0..10usize {
        sampler.add(tag, &mut rng);
    }

    let draws: u32 = 20_000;
    let mut counts = vec![0u32; 10];
    for _ in 0..draws {
        counts[*sampler.draw(&mut rng).unwrap()] += 1;
    }

    let expected = vec![0.1; 10];
    let chi_squared = chi_squared_test(&counts, &expected, draws);
    // df = 9
    assert!(chi_squared < 30.0, "Chi-squared value {}", chi_squared);
}
