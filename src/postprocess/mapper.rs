// 该文件是 Qianli （千里眼） 项目的一部分。
// src/postprocess/mapper.rs - 坐标映射
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

use crate::postprocess::{Detection, ImageSpace, LetterboxParams, ModelSpace};

/// 模型输入空间到原始图像空间的逆映射。
///
/// 两条预处理路径对应两个不可互换的逆公式：
///
/// - `Uniform`：静态图片路径，原图被直接拉伸到正方形输入（无填充），
///   逆映射是各轴独立的乘法；
/// - `Letterbox`：实时采集路径，帧经信箱式缩放进入输入，逆映射先减
///   填充再除以统一比例。
///
/// 调用方必须记录检测来自哪条预处理路径，并恰好应用一次对应的逆映射。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateMap {
  Uniform { scale_x: f32, scale_y: f32 },
  Letterbox(LetterboxParams),
}

impl CoordinateMap {
  /// 静态图片路径：由原图尺寸与模型输入尺寸得到各轴缩放
  pub fn uniform(orig_w: u32, orig_h: u32, model_w: u32, model_h: u32) -> Option<Self> {
    if orig_w == 0 || orig_h == 0 || model_w == 0 || model_h == 0 {
      return None;
    }

    Some(CoordinateMap::Uniform {
      scale_x: orig_w as f32 / model_w as f32,
      scale_y: orig_h as f32 / model_h as f32,
    })
  }

  /// 把一个模型空间检测映射回原始图像空间。
  ///
  /// 置信度与标签原样保留。比例非正时该框视为无检测。
  pub fn to_image_space(&self, det: Detection<ModelSpace>) -> Option<Detection<ImageSpace>> {
    match self {
      CoordinateMap::Uniform { scale_x, scale_y } => {
        if *scale_x <= 0.0 || *scale_y <= 0.0 {
          return None;
        }
        Some(Detection::new(
          det.x * scale_x,
          det.y * scale_y,
          det.width * scale_x,
          det.height * scale_y,
          det.confidence,
          det.class_id,
          det.label,
        ))
      }
      CoordinateMap::Letterbox(params) => params
        .unmap_rect(det.x, det.y, det.width, det.height)
        .map(|(x, y, w, h)| {
          Detection::new(x, y, w, h, det.confidence, det.class_id, det.label)
        }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn model_det(x: f32, y: f32, w: f32, h: f32) -> Detection<ModelSpace> {
    Detection::new(x, y, w, h, 0.9, 0, "person".to_string())
  }

  #[test]
  fn uniform_map_scales_each_axis() {
    let map = CoordinateMap::uniform(1280, 720, 640, 640).unwrap();
    let det = map.to_image_space(model_det(320.0, 320.0, 64.0, 64.0)).unwrap();
    assert_eq!(det.x, 640.0);
    assert_eq!(det.y, 360.0);
    assert_eq!(det.width, 128.0);
    assert_eq!(det.height, 72.0);
    assert_eq!(det.confidence, 0.9);
    assert_eq!(det.label, "person");
  }

  #[test]
  fn letterbox_map_removes_padding_before_scaling() {
    // 1280x720 → 640x640: scale 0.5, pad_y 140
    let params = LetterboxParams::compute(1280, 720, 640, 640).unwrap();
    let map = CoordinateMap::Letterbox(params);
    let det = map.to_image_space(model_det(100.0, 240.0, 50.0, 50.0)).unwrap();
    assert_eq!(det.x, 200.0);
    assert_eq!(det.y, 200.0);
    assert_eq!(det.width, 100.0);
    assert_eq!(det.height, 100.0);
  }

  #[test]
  fn degenerate_scale_drops_the_box() {
    let map = CoordinateMap::Uniform {
      scale_x: 0.0,
      scale_y: 1.0,
    };
    assert!(map.to_image_space(model_det(1.0, 1.0, 1.0, 1.0)).is_none());

    let map = CoordinateMap::Letterbox(LetterboxParams {
      scale: 0.0,
      pad_x: 0,
      pad_y: 0,
    });
    assert!(map.to_image_space(model_det(1.0, 1.0, 1.0, 1.0)).is_none());

    assert!(CoordinateMap::uniform(0, 720, 640, 640).is_none());
  }
}
