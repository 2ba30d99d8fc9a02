// 该文件是 Qianli （千里眼） 项目的一部分。
// src/postprocess.rs - 检测后处理管线
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

use std::marker::PhantomData;

use tracing::debug;

use crate::config::PipelineConfig;
use crate::labels::ClassCatalog;
use crate::model::RawOutput;

pub mod decode;
pub mod layout;
pub mod letterbox;
pub mod mapper;
pub mod nms;

pub use decode::{DecodePlan, decode};
pub use layout::TensorLayout;
pub use letterbox::LetterboxParams;
pub use mapper::CoordinateMap;
pub use nms::{iou, non_max_suppression};

/// 模型输入坐标空间标记（固定的正方形网络输入尺寸）
#[derive(Debug, Clone, Copy)]
pub struct ModelSpace;

/// 原始图像坐标空间标记（采集或加载的原始图像尺寸）
#[derive(Debug, Clone, Copy)]
pub struct ImageSpace;

/// 单个检测结果
///
/// `Space` 标记该检测框所在的坐标空间。解码与抑制阶段产生
/// `Detection<ModelSpace>`，坐标映射阶段产生 `Detection<ImageSpace>`，
/// 两种空间的检测框是不同的类型，不会被混用。
#[derive(Debug, Clone)]
pub struct Detection<Space> {
  /// 边界框左上角 x 坐标
  pub x: f32,
  /// 边界框左上角 y 坐标
  pub y: f32,
  /// 边界框宽度
  pub width: f32,
  /// 边界框高度
  pub height: f32,
  /// 置信度
  pub confidence: f32,
  /// 类别索引
  pub class_id: usize,
  /// 类别名称
  pub label: String,
  _space: PhantomData<Space>,
}

impl<Space> Detection<Space> {
  pub fn new(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    confidence: f32,
    class_id: usize,
    label: String,
  ) -> Self {
    Self {
      x,
      y,
      width,
      height,
      confidence,
      class_id,
      label,
      _space: PhantomData,
    }
  }
}

/// 完整的检测后处理：布局解析 → 解码 → 非极大值抑制 → 坐标映射。
///
/// 任何无法解释的输出张量（维度数不对、批大小不为 1、属性数不足）
/// 都退化为空检测列表，而不是错误：对下游来说“没有检测到目标”与
/// “模型输出无法解释”是同一种结果。
pub fn postprocess(
  raw: &RawOutput,
  catalog: &ClassCatalog,
  config: &PipelineConfig,
  map: &CoordinateMap,
) -> Vec<Detection<ImageSpace>> {
  let Some(layout) = TensorLayout::resolve(&raw.dims) else {
    debug!("无法解析输出张量布局: {:?}", raw.dims);
    return Vec::new();
  };

  let Some(plan) = DecodePlan::select(&layout) else {
    debug!("不支持的每框属性数: {}", layout.elem_per_box);
    return Vec::new();
  };

  let candidates = decode(&raw.data, &layout, &plan, catalog, config.confidence_threshold);
  debug!("置信度过滤后候选框数量: {}", candidates.len());

  if candidates.is_empty() {
    return Vec::new();
  }

  // Case A 的输出已由模型完成去重，跳过 NMS
  let kept = if plan.presuppressed() {
    candidates
  } else {
    non_max_suppression(candidates, config.iou_threshold)
  };
  debug!("抑制后保留框数量: {}", kept.len());

  kept
    .into_iter()
    .filter_map(|det| map.to_image_space(det))
    .collect()
}
