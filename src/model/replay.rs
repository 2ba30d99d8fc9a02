// 该文件是 Qianli （千里眼） 项目的一部分。
// src/model/replay.rs - 回放模型
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

use std::convert::Infallible;
use std::marker::PhantomData;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::model::{Model, RawOutput};
use crate::{FromUrl, FromUrlWithScheme};

/// 回放模型：从 JSON 文件提供事先转储的推理输出。
///
/// 推理本身由外部提供方完成；回放让管线在没有加速器的环境下也能
/// 端到端运行。文件格式：`{"dims": [1, 84, 8400], "data": [...]}`。
pub struct ReplayModel<Frame> {
  output: RawOutput,
  _phantom: PhantomData<Frame>,
}

#[derive(Error, Debug)]
pub enum ReplayModelError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("张量文件格式错误: {0}")]
  FormatError(String),
}

const REPLAY_SCHEME: &str = "replay";

impl<Frame> FromUrlWithScheme for ReplayModel<Frame> {
  const SCHEME: &'static str = REPLAY_SCHEME;
}

impl<Frame> FromUrl for ReplayModel<Frame> {
  type Error = ReplayModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != REPLAY_SCHEME {
      return Err(ReplayModelError::SchemeMismatch);
    }

    let path = url.path();
    info!("加载回放张量文件: {}", path);
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;

    let dims = value["dims"]
      .as_array()
      .ok_or_else(|| ReplayModelError::FormatError("缺少 dims 数组".to_string()))?
      .iter()
      .map(|v| {
        v.as_u64()
          .map(|d| d as usize)
          .ok_or_else(|| ReplayModelError::FormatError("dims 元素不是非负整数".to_string()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    let data = value["data"]
      .as_array()
      .ok_or_else(|| ReplayModelError::FormatError("缺少 data 数组".to_string()))?
      .iter()
      .map(|v| {
        v.as_f64()
          .map(|f| f as f32)
          .ok_or_else(|| ReplayModelError::FormatError("data 元素不是数字".to_string()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    // 形状乘积用 checked_mul 累积，恶意形状的溢出按格式错误处理
    let expected = dims
      .iter()
      .try_fold(1usize, |acc, d| acc.checked_mul(*d))
      .ok_or_else(|| ReplayModelError::FormatError("形状乘积溢出".to_string()))?;
    if data.len() != expected {
      return Err(ReplayModelError::FormatError(format!(
        "数据长度与形状不符: 期望 {}, 实际 {}",
        expected,
        data.len()
      )));
    }

    debug!("回放张量形状: {:?}, 元素数: {}", dims, data.len());

    Ok(ReplayModel {
      output: RawOutput::new(data, dims),
      _phantom: PhantomData,
    })
  }
}

impl<Frame> Model for ReplayModel<Frame> {
  type Input = Frame;
  type Output = RawOutput;
  type Error = Infallible;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(self.output.clone())
  }
}
