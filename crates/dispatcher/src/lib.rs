//! # Dispatcher
//!
//! 多目标任务分发模块。
//!
//! 负责：
//! - 维护目标注册表（注册顺序即扫描顺序）
//! - 每个目标一个 FIFO 队列，同一时刻最多一个任务在执行
//! - 某个目标执行挂起时，其他空闲目标照常被调度
//! - 记录每次执行结果，提供按目标等待队列清空的能力

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod instance;
pub mod metrics;
pub mod queue;
pub mod registry;
pub mod result_log;
pub mod waiter;

#[cfg(test)]
mod testing;

pub use contracts::{AutomationClient, DispatcherConfig, Task, TargetSpec, WaitConfig};
pub use dispatcher::{Dispatcher, RunSummary};
pub use error::{DispatcherError, Result};
pub use handle::DispatcherHandle;
pub use instance::{TargetInstance, TargetStatus};
pub use metrics::{MetricsSnapshot, TargetMetrics};
pub use queue::TaskQueue;
pub use registry::TargetRegistry;
pub use result_log::{ResultLog, ResultRecord};
pub use waiter::DrainResult;
