// 该文件是 Qianli （千里眼） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Qianli 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源 URL
  /// 支持格式:
  /// - 图像文件: image:///path/to/file.jpg
  /// - 信箱式预处理: image:///path/to/file.jpg?letterbox
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 模型输出来源 URL
  /// 支持格式:
  /// - 回放张量文件: replay:///path/to/tensor.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输出 URL
  /// 支持格式:
  /// - 控制台: console:
  /// - 目录记录: folder:///path/to/dir
  #[arg(long, default_value = "console:", value_name = "OUTPUT")]
  pub output: Url,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.45", value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 任务类型: oneshot 或 continuous
  #[arg(long, default_value = "oneshot", value_name = "TASK")]
  pub task: String,

  /// 最大处理帧数（仅连续任务有效）
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 单次取帧超时（毫秒，仅连续任务有效）
  #[arg(long, default_value = "1000", value_name = "TIMEOUT_MS")]
  pub frame_timeout_ms: u64,
}
