//! 配额跟踪服务 - 业务能力层
//!
//! 每个测验允许删除 1 道题、重新生成 5 道题（可配置）。
//! 使用量只认服务端记录：本地检查只是提前拦截，每次操作后都以服务端返回的计数为准，
//! 刷新页面或重启程序不会重置配额。

use crate::config::QuotaLimits;
use crate::error::QuotaError;
use crate::models::{Quiz, QuotaUsage};
use tracing::debug;

/// 配额跟踪器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaTracker {
    limits: QuotaLimits,
    usage: QuotaUsage,
}

impl QuotaTracker {
    pub fn new(limits: QuotaLimits, usage: QuotaUsage) -> Self {
        Self { limits, usage }
    }

    /// 从服务端的测验记录构建
    pub fn from_quiz(limits: QuotaLimits, quiz: &Quiz) -> Self {
        Self::new(limits, quiz.quota)
    }

    pub fn usage(&self) -> QuotaUsage {
        self.usage
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    pub fn remaining_regenerations(&self) -> u32 {
        self.limits
            .max_regenerations
            .saturating_sub(self.usage.regenerations_used)
    }

    pub fn remaining_deletions(&self) -> u32 {
        self.limits.max_deletions.saturating_sub(self.usage.deletions_used)
    }

    /// 调用服务端前检查是否还能重新生成
    pub fn check_regenerate(&self) -> Result<(), QuotaError> {
        if self.remaining_regenerations() == 0 {
            return Err(QuotaError::RegenerationsExhausted {
                limit: self.limits.max_regenerations,
            });
        }
        Ok(())
    }

    /// 调用服务端前检查是否还能删除
    pub fn check_delete(&self) -> Result<(), QuotaError> {
        if self.remaining_deletions() == 0 {
            return Err(QuotaError::DeletionsExhausted {
                limit: self.limits.max_deletions,
            });
        }
        Ok(())
    }

    /// 采用服务端返回的计数
    pub fn sync(&mut self, server_usage: QuotaUsage) {
        if server_usage != self.usage {
            debug!(
                "配额同步: 重新生成 {} → {}, 删除 {} → {}",
                self.usage.regenerations_used,
                server_usage.regenerations_used,
                self.usage.deletions_used,
                server_usage.deletions_used
            );
        }
        self.usage = server_usage;
    }
}
