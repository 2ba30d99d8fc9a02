// 该文件是 Qianli （千里眼） 项目的一部分。
// src/config.rs - 管线运行时配置
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::sync::{Arc, RwLock};

/// 单次管线调用的阈值配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
  /// 置信度阈值 (0.0 - 1.0)
  pub confidence_threshold: f32,
  /// NMS IOU 阈值 (0.0 - 1.0)
  pub iou_threshold: f32,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: 0.5,
      iou_threshold: 0.45,
    }
  }
}

/// 可在运行期间更新的共享配置。
///
/// 设置界面一侧调用 `set`，处理循环在每一帧开始时调用 `get` 读取
/// 当帧生效的快照，无需重启循环。
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
  inner: Arc<RwLock<PipelineConfig>>,
}

impl SharedConfig {
  pub fn new(config: PipelineConfig) -> Self {
    Self {
      inner: Arc::new(RwLock::new(config)),
    }
  }

  /// 当前配置的快照
  pub fn get(&self) -> PipelineConfig {
    *self.inner.read().unwrap()
  }

  pub fn set(&self, config: PipelineConfig) {
    *self.inner.write().unwrap() = config;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn updates_are_visible_to_clones() {
    let shared = SharedConfig::new(PipelineConfig::default());
    let other = shared.clone();

    other.set(PipelineConfig {
      confidence_threshold: 0.25,
      iou_threshold: 0.6,
    });

    assert_eq!(shared.get().confidence_threshold, 0.25);
    assert_eq!(shared.get().iou_threshold, 0.6);
  }
}
