// 该文件是 Qianli （千里眼） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use qianli::FromUrl;
use qianli::config::{PipelineConfig, SharedConfig};
use qianli::frame::PlanarFrame;
use qianli::input::InputWrapper;
use qianli::model::ReplayModel;
use qianli::output::OutputWrapper;
use qianli::task::{ContinuousTask, OneShotTask, Task};

/// 模型输入尺寸（正方形）
const MODEL_W: u32 = 640;
const MODEL_H: u32 = 640;

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("输入来源: {}", args.input);
  info!("模型输出来源: {}", args.model);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {}", args.nms_threshold);

  let input = InputWrapper::<MODEL_W, MODEL_H>::from_url(&args.input)?;
  let model: ReplayModel<PlanarFrame<MODEL_W, MODEL_H>> = ReplayModel::from_url(&args.model)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let config = SharedConfig::new(PipelineConfig {
    confidence_threshold: args.confidence,
    iou_threshold: args.nms_threshold,
  });

  match args.task.as_str() {
    "oneshot" => OneShotTask::new(config).run_task(input, model, output)?,
    "continuous" => ContinuousTask::new(config)
      .with_frame_number(args.frame_number)
      .with_frame_timeout(Duration::from_millis(args.frame_timeout_ms))
      .run_task(input, model, output)?,
    other => anyhow::bail!("未知任务类型: {}", other),
  }

  Ok(())
}
