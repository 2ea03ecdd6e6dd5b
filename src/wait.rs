//! Busy-wait helpers
//!
//! Nothing else runs while waiting. Without a bound a condition that never becomes true blocks
//! forever, recovery is left to a watchdog.

/// Bounded wait expired before the condition became true
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timeout;

/// Polls `done` until it returns true
///
/// * `limit`: max. number of polls, `None` waits indefinitely. The condition is polled at least once.
pub fn block_until<F>(mut done: F, limit: Option<u32>) -> Result<(), Timeout>
where
    F: FnMut() -> bool,
{
    match limit {
        None => {
            while !done() {
                core::hint::spin_loop();
            }

            Ok(())
        }
        Some(limit) => {
            let mut polls = 0;

            loop {
                if done() {
                    return Ok(());
                }

                polls += 1;
                if polls >= limit {
                    return Err(Timeout);
                }

                core::hint::spin_loop();
            }
        }
    }
}

/// Spins for the given number of iterations and returns the number of iterations executed
///
/// The counter passes through [core::hint::black_box] so the loop survives optimization on targets
/// where [core::hint::spin_loop] is a no-op (e.g. AVR).
pub fn spin(cycles: u32) -> u32 {
    let mut iterations = 0;

    while core::hint::black_box(iterations) < cycles {
        iterations += 1;
        core::hint::spin_loop();
    }

    iterations
}
