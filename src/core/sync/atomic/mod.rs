/*!
 * Atomic Operations
 *
 * Exchange, compare-exchange, increment, decrement, add, subtract, and,
 * or and xor over 32/64-bit integers, plus exchange and compare-exchange
 * over typed pointers. Every operation takes one of four ordering variants.
 *
 * # Return Convention
 *
 * - `increment` / `decrement` return the value *after* the update, so a
 *   reference count can detect reaching zero
 * - `add` / `subtract` / `and` / `or` / `xor` return the value *before* the update
 * - `compare_exchange` returns the value observed at the comparison
 */

mod cell;
mod interlocked;
mod intrinsics;
mod order;
mod pointer;
mod word;

pub use cell::AtomicCell;
pub use interlocked::InterlockedAtomics;
pub use intrinsics::IntrinsicAtomics;
pub use order::MemoryOrder;
pub use pointer::AtomicPointer;
pub use word::AtomicWord;
