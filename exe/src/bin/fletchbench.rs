// SPDX-License-Identifier: GPL-2.0 OR MIT

use std::error::Error;
use std::time::Instant;

use fletch::checksum::{
    Checksum, Fletcher128, Fletcher128Implementation, Fletcher64, Fletcher64Implementation,
    StripeConfig, StripeSet,
};

const MICROSECONDS_PER_SECOND: u64 = 1_000_000;
const MICROSECONDS_IN_MILLISECOND: u64 = 1_000;

/// Stripe counts measured for the striped engine.
const STRIPE_COUNTS: [usize; 3] = [1, 4, 8];

/** Run `f` repeatedly for at least a millisecond.
 *
 * Returns throughput of `size` bytes per call in `display_units` per second.
 */
fn measure<F>(size: usize, display_units: u64, mut f: F) -> Result<u64, Box<dyn Error>>
where
    F: FnMut() -> Result<(), Box<dyn Error>>,
{
    let iterations = 32;

    // Warm up.
    f()?;

    // Keep track of elapsed time and work.
    let mut microseconds = 0;
    let mut total_iterations = 0;

    let start = Instant::now();

    while microseconds < MICROSECONDS_IN_MILLISECOND {
        for _ in 0..iterations {
            f()?;
            total_iterations += 1;
        }

        microseconds = start.elapsed().as_micros() as u64;
    }

    // Total number of bytes hashed.
    let total_size = (size as u64) * total_iterations;

    // Bytes per second.
    let bytes_per_second = (MICROSECONDS_PER_SECOND * total_size) / microseconds;

    Ok(bytes_per_second / display_units)
}

fn main() -> Result<(), Box<dyn Error>> {
    // 128 KiB.
    let size: usize = 128 * 1024;
    let display_units = 1024 * 1024;

    let mut data: Vec<u8> = vec![0; size];

    // Fill data buffer.
    for (i, v) in data.iter_mut().enumerate() {
        *v = i as u8;
    }

    println!("{:>24} {:>11}", "implementation", "MiB/s");

    for implementation in Fletcher64Implementation::all() {
        let mut h = Fletcher64::new(*implementation);
        let rate = measure(size, display_units, || {
            h.hash(&data);
            Ok(())
        })?;
        println!("{:>24} {:11}", format!("fletcher64-{}", implementation), rate);
    }

    for implementation in Fletcher128Implementation::all() {
        let mut h = Fletcher128::new(*implementation);
        let rate = measure(size, display_units, || {
            h.hash(&data);
            Ok(())
        })?;
        println!("{:>24} {:11}", format!("fletcher128-{}", implementation), rate);
    }

    for stripes in STRIPE_COUNTS {
        let config = StripeConfig::new(size / stripes, stripes)?;
        let mut set = StripeSet::new(config);
        let rate = measure(size, display_units, || {
            set.reset();
            set.update(&data)?;
            Ok(())
        })?;
        println!("{:>24} {:11}", format!("striped-{}", stripes), rate);
    }

    Ok(())
}
