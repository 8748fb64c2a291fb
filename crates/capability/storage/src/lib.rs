//! 存储能力
//!
//! 对外暴露三层内容：
//! - `models`: 存储记录结构（设备、楼宇、位置、角色、状态、事件等）
//! - `traits`: 异步存储接口（外部持久化引擎的接缝）
//! - `in_memory`: 内存实现（运行时默认后端，亦用于测试）
//!
//! 持久化引擎本身（SQL/文档库）不在本仓库范围内，接口即边界。

pub mod error;
pub mod in_memory;
pub mod models;
pub mod traits;

pub use error::StorageError;
pub use in_memory::*;
pub use models::*;
pub use traits::*;
