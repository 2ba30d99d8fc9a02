// 该文件是 Qianli （千里眼） 项目的一部分。
// src/postprocess/nms.rs - 非极大值抑制
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

use crate::postprocess::Detection;

/// 类别无关的贪心非极大值抑制。
///
/// 按置信度降序稳定排序后，反复取出剩余最高分的框，剔除所有与其
/// IoU 达到阈值的框。抑制不区分类别：不同类别的两个重叠框会互相
/// 抑制。这是有意保留的行为，区分类别的变体会改变输出结果。
/// 复杂度 O(n²)，置信度过滤通常已把候选数降到几十个。
pub fn non_max_suppression<S>(
  mut candidates: Vec<Detection<S>>,
  iou_threshold: f32,
) -> Vec<Detection<S>> {
  // sort_by 是稳定排序，得分相同的框保持输入顺序
  candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  let mut kept = Vec::new();
  while !candidates.is_empty() {
    let best = candidates.remove(0);
    candidates.retain(|other| iou(&best, other) < iou_threshold);
    kept.push(best);
  }

  kept
}

/// 两个轴对齐矩形的交并比。
///
/// 负的重叠宽高先钳制为零再相乘；交集为零或并集非正时返回 0。
pub fn iou<S>(a: &Detection<S>, b: &Detection<S>) -> f32 {
  let x1 = a.x.max(b.x);
  let y1 = a.y.max(b.y);
  let x2 = (a.x + a.width).min(b.x + b.width);
  let y2 = (a.y + a.height).min(b.y + b.height);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let union = a.width * a.height + b.width * b.height - intersection;

  if intersection > 0.0 && union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::postprocess::ModelSpace;

  fn det(x: f32, y: f32, w: f32, h: f32, confidence: f32, class_id: usize) -> Detection<ModelSpace> {
    Detection::new(x, y, w, h, confidence, class_id, format!("class_{class_id}"))
  }

  #[test]
  fn overlapping_boxes_collapse_to_strongest() {
    let result = non_max_suppression(
      vec![
        det(0.0, 0.0, 10.0, 10.0, 0.7, 0),
        det(1.0, 1.0, 10.0, 10.0, 0.9, 0),
      ],
      0.45,
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].confidence, 0.9);
  }

  #[test]
  fn disjoint_boxes_both_survive() {
    let result = non_max_suppression(
      vec![
        det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        det(100.0, 100.0, 10.0, 10.0, 0.7, 0),
      ],
      0.45,
    );
    assert_eq!(result.len(), 2);
    // 输出按置信度降序
    assert_eq!(result[0].confidence, 0.9);
    assert_eq!(result[1].confidence, 0.7);
  }

  #[test]
  fn suppression_ignores_class() {
    // 类别不同但重叠度高，仍然互相抑制
    let result = non_max_suppression(
      vec![
        det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        det(0.0, 0.0, 10.0, 10.0, 0.8, 7),
      ],
      0.45,
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].class_id, 0);
  }

  #[test]
  fn suppression_is_idempotent() {
    let input = vec![
      det(0.0, 0.0, 10.0, 10.0, 0.9, 0),
      det(2.0, 2.0, 10.0, 10.0, 0.8, 1),
      det(50.0, 50.0, 10.0, 10.0, 0.7, 2),
      det(51.0, 51.0, 10.0, 10.0, 0.6, 2),
    ];
    let once = non_max_suppression(input, 0.45);
    let twice = non_max_suppression(once.clone(), 0.45);

    assert_eq!(once.len(), twice.len());
    for (a, b) in once.iter().zip(twice.iter()) {
      assert_eq!(a.x, b.x);
      assert_eq!(a.confidence, b.confidence);
      assert_eq!(a.class_id, b.class_id);
    }
  }

  #[test]
  fn touching_boxes_have_zero_iou() {
    let a = det(0.0, 0.0, 10.0, 10.0, 0.9, 0);
    let b = det(10.0, 0.0, 10.0, 10.0, 0.8, 0);
    assert_eq!(iou(&a, &b), 0.0);
  }

  #[test]
  fn zero_area_box_has_zero_iou() {
    let a = det(0.0, 0.0, 0.0, 0.0, 0.9, 0);
    let b = det(0.0, 0.0, 10.0, 10.0, 0.8, 0);
    assert_eq!(iou(&a, &b), 0.0);
  }

  #[test]
  fn ties_keep_input_order() {
    let result = non_max_suppression(
      vec![
        det(0.0, 0.0, 10.0, 10.0, 0.8, 1),
        det(100.0, 100.0, 10.0, 10.0, 0.8, 2),
      ],
      0.45,
    );
    assert_eq!(result[0].class_id, 1);
    assert_eq!(result[1].class_id, 2);
  }
}
