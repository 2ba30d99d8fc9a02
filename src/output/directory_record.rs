// 该文件是 Qianli （千里眼） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Utc};
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::output::Render;
use crate::postprocess::{Detection, ImageSpace};
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 目录记录输出：按 年/月/日 目录结构为每帧写一个 JSON 检测记录。
///
/// `folder:///path/to/dir` 选择该输出；查询参数 `always` 使空结果的
/// 帧也被记录。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: Arc<Mutex<u16>>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = url.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(url.path()),
      frame_counter: Arc::new(Mutex::new(0)),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    let mut counter = self.frame_counter.lock().unwrap();
    let id = counter.wrapping_add(1);
    *counter = id;
    id
  }

  fn frame_path(&self) -> Result<PathBuf, std::io::Error> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}.json",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl<F> Render<F, Vec<Detection<ImageSpace>>> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(
    &self,
    _frame: &F,
    result: &Vec<Detection<ImageSpace>>,
  ) -> Result<(), Self::Error> {
    if result.is_empty() && !self.always {
      return Ok(());
    }

    let items: Vec<serde_json::Value> = result
      .iter()
      .map(|det| {
        json!({
          "label": det.label,
          "class_id": det.class_id,
          "confidence": det.confidence,
          "x": det.x,
          "y": det.y,
          "width": det.width,
          "height": det.height,
        })
      })
      .collect();

    let record = json!({
      "timestamp": Utc::now().to_rfc3339(),
      "detections": items,
    });

    let path = self.frame_path()?;
    std::fs::write(path, serde_json::to_string_pretty(&record)?)?;
    Ok(())
  }
}
