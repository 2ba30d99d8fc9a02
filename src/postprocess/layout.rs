// 该文件是 Qianli （千里眼） 项目的一部分。
// src/postprocess/layout.rs - 输出张量布局解析
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

/// 每框属性数的上限，用于区分两种导出布局。
///
/// 检测模型的导出惯例要么把一个较小的属性数（4 个坐标加至多约 300 个
/// 类别得分）放在大量候选框（数千个锚点）之前，要么反过来。该阈值在
/// 没有模型元数据的情况下区分这两种已知布局。约束：类别数超过 300 且
/// 候选框数少于类别数的模型会被误判，这是已接受的限制，调整阈值前
/// 需要做兼容性审查。
const MAX_ELEM_PER_BOX: usize = 300;

/// 解析后的输出张量布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorLayout {
  /// 候选框数量
  pub num_boxes: usize,
  /// 每框属性数
  pub elem_per_box: usize,
  /// 张量组织方式：true 为 (batch, boxes, attributes)，
  /// false 为 (batch, attributes, boxes)
  pub boxes_first: bool,
}

impl TensorLayout {
  /// 从输出张量的形状推断布局。
  ///
  /// 仅接受三维、批大小为 1 的张量，其余形状返回 `None`。
  pub fn resolve(dims: &[usize]) -> Option<Self> {
    if dims.len() != 3 || dims[0] != 1 {
      return None;
    }

    let (d1, d2) = (dims[1], dims[2]);
    if d1 <= MAX_ELEM_PER_BOX && d2 > d1 {
      Some(TensorLayout {
        num_boxes: d2,
        elem_per_box: d1,
        boxes_first: false,
      })
    } else {
      Some(TensorLayout {
        num_boxes: d1,
        elem_per_box: d2,
        boxes_first: true,
      })
    }
  }

  /// 读取第 `box_idx` 个候选框的第 `attr_idx` 个属性
  #[inline]
  pub fn attr(&self, data: &[f32], box_idx: usize, attr_idx: usize) -> f32 {
    if self.boxes_first {
      data[box_idx * self.elem_per_box + attr_idx]
    } else {
      data[attr_idx * self.num_boxes + box_idx]
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_first_shape() {
    let layout = TensorLayout::resolve(&[1, 84, 8400]).unwrap();
    assert_eq!(layout.elem_per_box, 84);
    assert_eq!(layout.num_boxes, 8400);
    assert!(!layout.boxes_first);
  }

  #[test]
  fn box_first_shape() {
    let layout = TensorLayout::resolve(&[1, 8400, 84]).unwrap();
    assert_eq!(layout.elem_per_box, 84);
    assert_eq!(layout.num_boxes, 8400);
    assert!(layout.boxes_first);
  }

  #[test]
  fn presuppressed_shape_is_box_first() {
    // d2 不大于 d1，按 box-first 解析
    let layout = TensorLayout::resolve(&[1, 300, 6]).unwrap();
    assert_eq!(layout.num_boxes, 300);
    assert_eq!(layout.elem_per_box, 6);
    assert!(layout.boxes_first);
  }

  #[test]
  fn rejects_wrong_rank_and_batch() {
    assert!(TensorLayout::resolve(&[1, 84]).is_none());
    assert!(TensorLayout::resolve(&[1, 84, 8400, 1]).is_none());
    assert!(TensorLayout::resolve(&[2, 84, 8400]).is_none());
    assert!(TensorLayout::resolve(&[0, 84, 8400]).is_none());
  }

  #[test]
  fn attr_indexing_matches_layout() {
    // 2 框 3 属性，box-first: [a0 a1 a2 | b0 b1 b2]
    let data = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
    let boxes_first = TensorLayout {
      num_boxes: 2,
      elem_per_box: 3,
      boxes_first: true,
    };
    assert_eq!(boxes_first.attr(&data, 0, 1), 1.0);
    assert_eq!(boxes_first.attr(&data, 1, 2), 12.0);

    // 通道在前: [a0 b0 | a1 b1 | a2 b2]
    let channel_first = TensorLayout {
      num_boxes: 2,
      elem_per_box: 3,
      boxes_first: false,
    };
    assert_eq!(channel_first.attr(&data, 0, 1), 2.0);
    assert_eq!(channel_first.attr(&data, 1, 1), 10.0);
  }
}
