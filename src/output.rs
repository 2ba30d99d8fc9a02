// 该文件是 Qianli （千里眼） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::postprocess::{Detection, ImageSpace};
use crate::{FromUrl, FromUrlWithScheme};

/// 检测结果的消费方。
///
/// 结果列表按抑制顺序排列（过滤后按置信度降序），消费方不应依赖
/// 空间顺序。
pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

/// 控制台输出：把检测结果写入日志
pub struct ConsoleOutput;

const CONSOLE_SCHEME: &str = "console";

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = CONSOLE_SCHEME;
}

impl FromUrl for ConsoleOutput {
  type Error = Infallible;

  fn from_url(_url: &Url) -> Result<Self, Self::Error> {
    Ok(ConsoleOutput)
  }
}

impl<F> Render<F, Vec<Detection<ImageSpace>>> for ConsoleOutput {
  type Error = Infallible;

  fn render_result(
    &self,
    _frame: &F,
    result: &Vec<Detection<ImageSpace>>,
  ) -> Result<(), Self::Error> {
    info!("检测到 {} 个目标", result.len());
    for det in result {
      info!(
        "  - {}: {:.2}% at ({:.0}, {:.0}, {:.0}x{:.0})",
        det.label,
        det.confidence * 100.0,
        det.x,
        det.y,
        det.width,
        det.height
      );
    }
    Ok(())
  }
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  Console(ConsoleOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecord(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      CONSOLE_SCHEME => Ok(OutputWrapper::Console(ConsoleOutput)),
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecord(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl<F> Render<F, Vec<Detection<ImageSpace>>> for OutputWrapper {
  type Error = OutputError;

  fn render_result(
    &self,
    frame: &F,
    result: &Vec<Detection<ImageSpace>>,
  ) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Console(output) => output
        .render_result(frame, result)
        .map_err(|e| match e {}),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecord(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}
