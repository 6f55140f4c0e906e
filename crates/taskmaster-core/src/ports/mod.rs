//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」を定義します。
//! ストレージと時計を trait の向こう側に隠し、実装（impls）を差し替え可能にします。

pub mod clock;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::task_store::TaskStore;
