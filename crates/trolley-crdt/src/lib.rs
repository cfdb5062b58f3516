//! Delta-state CRDTs for replicated shopping lists.
//!
//! Replicas edit their own copy without coordination. Every edit returns a
//! small *delta* of the same type; shipping deltas and joining them in any
//! order, any number of times, brings every replica to the same state.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  ShoppingList                                    │
//! │  add-wins item set + per-item CCounter pair      │
//! └──────────────┬─────────────────────┬─────────────┘
//!                │                     │
//!                ▼                     ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │  CCounter / EWFlag   │  │  DotKernel<String>   │
//! └──────────┬───────────┘  └──────────┬───────────┘
//!            └────────────┬────────────┘
//!                         ▼
//! ┌──────────────────────────────────────────────────┐
//! │  DotKernel<V>: Dot -> V, guarded by a            │
//! │  CausalContext (high-water marks + exceptions)   │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Kernels are single-writer: serialize mutations and joins on one instance.
//!
//! # References
//!
//! - Almeida, Shoker, Baquero, "Delta State Replicated Data Types"

pub mod context;
pub mod counter;
pub mod dot;
pub mod flag;
pub mod kernel;
pub mod shopping;
pub mod traits;

pub use context::{CausalContext, Compaction};
pub use counter::CCounter;
pub use dot::{Dot, DotParseError};
pub use flag::EWFlag;
pub use kernel::DotKernel;
pub use shopping::{ListError, ShoppingItem, ShoppingList};
pub use traits::DeltaCrdt;
