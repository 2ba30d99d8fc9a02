// 该文件是 Qianli （千里眼） 项目的一部分。
// src/postprocess/decode.rs - 候选框解码
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

use tracing::warn;

use crate::labels::ClassCatalog;
use crate::postprocess::{Detection, ModelSpace, TensorLayout};

/// 每个输出张量选定一次的解码方案
///
/// 三种互斥的每框编码：
///
/// - `Presuppressed`（每框 6 属性）：`[x1, y1, x2, y2, score, class]`，
///   模型内部已完成去重，NMS 必须跳过；
/// - `ObjectnessGated`（box-first 且每框 ≥ 5 属性）：
///   `[cx, cy, w, h, objectness, class...]`，得分为 objectness 与最高
///   类别得分的乘积；
/// - `ClassScores`（通道在前）：`[cx, cy, w, h, class...]`，没有独立的
///   objectness 通道，得分直接取最高类别得分。
///
/// box-first 与通道在前两种布局对 objectness 通道的假设不同：这不是
/// 按属性数能区分的（两者形状特征相同），而是分别对应两条真实的模型
/// 导出管线的行为，必须按布局保持，不能统一。统一会改变其中一种布局
/// 的解码结果。对第三种导出惯例，这一假设可能产生错误的解码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePlan {
  Presuppressed,
  ObjectnessGated { num_classes: usize },
  ClassScores { num_classes: usize },
}

impl DecodePlan {
  /// 根据解析出的布局选择解码方案，无法解码时返回 `None`。
  pub fn select(layout: &TensorLayout) -> Option<Self> {
    if layout.elem_per_box == 6 {
      return Some(DecodePlan::Presuppressed);
    }
    if layout.elem_per_box < 5 {
      return None;
    }

    if layout.boxes_first {
      Some(DecodePlan::ObjectnessGated {
        num_classes: layout.elem_per_box - 5,
      })
    } else {
      Some(DecodePlan::ClassScores {
        num_classes: layout.elem_per_box - 4,
      })
    }
  }

  /// 该方案的输出是否已由模型完成去重
  pub fn presuppressed(&self) -> bool {
    matches!(self, DecodePlan::Presuppressed)
  }
}

/// 按解码方案提取置信度达标的候选框（模型输入坐标空间，未抑制）。
pub fn decode(
  data: &[f32],
  layout: &TensorLayout,
  plan: &DecodePlan,
  catalog: &ClassCatalog,
  confidence_threshold: f32,
) -> Vec<Detection<ModelSpace>> {
  // 乘法用 checked_mul：畸形形状的乘积可能溢出，溢出同样按空结果处理
  let Some(expected) = layout.num_boxes.checked_mul(layout.elem_per_box) else {
    warn!(
      "输出张量形状乘积溢出: {} x {}",
      layout.num_boxes, layout.elem_per_box
    );
    return Vec::new();
  };
  if data.len() < expected {
    warn!(
      "输出缓冲区长度不足: 期望至少 {}, 实际 {}",
      expected,
      data.len()
    );
    return Vec::new();
  }

  let mut detections = Vec::new();

  for i in 0..layout.num_boxes {
    let candidate = match plan {
      DecodePlan::Presuppressed => decode_presuppressed(data, layout, i, confidence_threshold),
      DecodePlan::ObjectnessGated { num_classes } => {
        decode_objectness_gated(data, layout, i, *num_classes, confidence_threshold)
      }
      DecodePlan::ClassScores { num_classes } => {
        decode_class_scores(data, layout, i, *num_classes, confidence_threshold)
      }
    };

    if let Some((x, y, w, h, confidence, class_id)) = candidate {
      detections.push(Detection::new(
        x,
        y,
        w,
        h,
        confidence,
        class_id,
        catalog.label(class_id),
      ));
    }
  }

  detections
}

/// Case A：`[x1, y1, x2, y2, score, class]`
fn decode_presuppressed(
  data: &[f32],
  layout: &TensorLayout,
  i: usize,
  threshold: f32,
) -> Option<(f32, f32, f32, f32, f32, usize)> {
  let score = layout.attr(data, i, 4);
  if score < threshold {
    return None;
  }

  let x1 = layout.attr(data, i, 0);
  let y1 = layout.attr(data, i, 1);
  let x2 = layout.attr(data, i, 2);
  let y2 = layout.attr(data, i, 3);
  let class_id = layout.attr(data, i, 5).max(0.0) as usize;

  Some((x1, y1, x2 - x1, y2 - y1, score, class_id))
}

/// Case B：`[cx, cy, w, h, objectness, class...]`
fn decode_objectness_gated(
  data: &[f32],
  layout: &TensorLayout,
  i: usize,
  num_classes: usize,
  threshold: f32,
) -> Option<(f32, f32, f32, f32, f32, usize)> {
  let objectness = layout.attr(data, i, 4);

  // 每框恰好 5 属性时没有类别通道，objectness 即最终得分
  let (score, class_id) = if num_classes == 0 {
    (objectness, 0)
  } else {
    let (best_score, best_class) = best_class(data, layout, i, 5, num_classes);
    (objectness * best_score, best_class)
  };

  if score < threshold {
    return None;
  }

  Some(center_to_corner(data, layout, i, score, class_id))
}

/// Case C：`[cx, cy, w, h, class...]`
fn decode_class_scores(
  data: &[f32],
  layout: &TensorLayout,
  i: usize,
  num_classes: usize,
  threshold: f32,
) -> Option<(f32, f32, f32, f32, f32, usize)> {
  let (score, class_id) = best_class(data, layout, i, 4, num_classes);
  if score < threshold {
    return None;
  }

  Some(center_to_corner(data, layout, i, score, class_id))
}

/// 在 `[offset, offset + num_classes)` 范围内按索引顺序找最高类别得分。
///
/// 严格大于比较：得分相同时保留最小的类别索引。
fn best_class(
  data: &[f32],
  layout: &TensorLayout,
  i: usize,
  offset: usize,
  num_classes: usize,
) -> (f32, usize) {
  let mut best_score = layout.attr(data, i, offset);
  let mut best_class = 0;

  for c in 1..num_classes {
    let score = layout.attr(data, i, offset + c);
    if score > best_score {
      best_score = score;
      best_class = c;
    }
  }

  (best_score, best_class)
}

/// 中心点形式转左上角形式
fn center_to_corner(
  data: &[f32],
  layout: &TensorLayout,
  i: usize,
  score: f32,
  class_id: usize,
) -> (f32, f32, f32, f32, f32, usize) {
  let cx = layout.attr(data, i, 0);
  let cy = layout.attr(data, i, 1);
  let w = layout.attr(data, i, 2);
  let h = layout.attr(data, i, 3);

  (cx - w / 2.0, cy - h / 2.0, w, h, score, class_id)
}
