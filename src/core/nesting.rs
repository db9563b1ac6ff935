//! Nesting limit for decoding the recursive wire and value types.
//!
//! `WireValue` and `ReplicatedValue` nest through arrays and maps, so a small
//! hostile payload can describe a tree deep enough to exhaust the stack while it
//! is being decoded. Their `Deserialize` impls take a [`NestingGuard`] per level,
//! which fails the decode once [`MAX_DECODE_DEPTH`] levels are open on the
//! current thread.

use serde::de::Error;
use std::cell::Cell;

/// Deepest nesting accepted when decoding a value from bytes
pub const MAX_DECODE_DEPTH: usize = 96;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// One open nesting level; closes on drop
pub(crate) struct NestingGuard(());

impl NestingGuard {
    pub(crate) fn enter<E: Error>() -> Result<Self, E> {
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > MAX_DECODE_DEPTH {
                return Err(E::custom(format!(
                    "value nesting exceeds the limit of {MAX_DECODE_DEPTH}"
                )));
            }
            depth.set(next);
            Ok(NestingGuard(()))
        })
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
