// 该文件是 Qianli （千里眼） 项目的一部分。
// src/postprocess/letterbox.rs - 信箱式缩放变换
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

/// 信箱式缩放参数
///
/// 将任意长宽比的图像不失真地放入固定尺寸的模型输入：先按统一比例
/// 缩放，再在两侧对称填充。`target = original * scale + 2 * pad`
/// 在整数取整的 ±1 像素容差内成立，残余的 1 像素吸收在一侧，不做
/// 特殊处理。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxParams {
  /// 统一缩放比例
  pub scale: f32,
  /// 水平方向单侧填充（模型输入像素）
  pub pad_x: i32,
  /// 垂直方向单侧填充（模型输入像素）
  pub pad_y: i32,
}

impl LetterboxParams {
  /// 正向计算：由原始尺寸与目标尺寸得到缩放与填充。
  ///
  /// 任一尺寸为 0 时返回 `None`。若采集方向与显示方向不一致，调用方
  /// 必须传入旋转后的尺寸。
  pub fn compute(orig_w: u32, orig_h: u32, target_w: u32, target_h: u32) -> Option<Self> {
    if orig_w == 0 || orig_h == 0 || target_w == 0 || target_h == 0 {
      return None;
    }

    let scale = (target_w as f32 / orig_w as f32).min(target_h as f32 / orig_h as f32);
    let (resized_w, resized_h) = Self::resized_extent(orig_w, orig_h, scale);

    Some(LetterboxParams {
      scale,
      pad_x: (target_w as i32 - resized_w as i32) / 2,
      pad_y: (target_h as i32 - resized_h as i32) / 2,
    })
  }

  /// 缩放后的内容尺寸（向下取整）
  pub fn resized_extent(orig_w: u32, orig_h: u32, scale: f32) -> (u32, u32) {
    (
      (orig_w as f32 * scale).floor() as u32,
      (orig_h as f32 * scale).floor() as u32,
    )
  }

  /// 逆向映射：把模型输入空间中的矩形还原到原始图像空间。
  ///
  /// 只作用于坐标与尺寸，不作用于置信度或标签。比例非正时该框视为
  /// 无检测，返回 `None`。
  pub fn unmap_rect(&self, x: f32, y: f32, w: f32, h: f32) -> Option<(f32, f32, f32, f32)> {
    if self.scale <= 0.0 {
      return None;
    }

    Some((
      (x - self.pad_x as f32) / self.scale,
      (y - self.pad_y as f32) / self.scale,
      w / self.scale,
      h / self.scale,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wide_image_pads_vertically() {
    let params = LetterboxParams::compute(1280, 720, 640, 640).unwrap();
    assert_eq!(params.scale, 0.5);
    assert_eq!(params.pad_x, 0);
    // 720 * 0.5 = 360, (640 - 360) / 2 = 140
    assert_eq!(params.pad_y, 140);
  }

  #[test]
  fn square_image_needs_no_padding() {
    let params = LetterboxParams::compute(320, 320, 640, 640).unwrap();
    assert_eq!(params.scale, 2.0);
    assert_eq!(params.pad_x, 0);
    assert_eq!(params.pad_y, 0);
  }

  #[test]
  fn zero_dimension_is_rejected() {
    assert!(LetterboxParams::compute(0, 720, 640, 640).is_none());
    assert!(LetterboxParams::compute(1280, 720, 640, 0).is_none());
  }

  #[test]
  fn round_trip_recovers_original_extent() {
    // 正向计算后，把缩放内容所在的矩形逆映射回去应恢复整幅原图，
    // 误差不超过 1 像素
    let cases = [
      (1280u32, 720u32),
      (720, 1280),
      (1920, 1080),
      (333, 777),
      (641, 639),
    ];
    for (orig_w, orig_h) in cases {
      let params = LetterboxParams::compute(orig_w, orig_h, 640, 640).unwrap();
      let (resized_w, resized_h) = LetterboxParams::resized_extent(orig_w, orig_h, params.scale);
      let (x, y, w, h) = params
        .unmap_rect(
          params.pad_x as f32,
          params.pad_y as f32,
          resized_w as f32,
          resized_h as f32,
        )
        .unwrap();

      // 模型输入空间中 1 像素的取整误差对应原图空间 1/scale 像素
      let tol = (1.0 / params.scale).max(1.0);
      assert!(x.abs() <= tol, "{orig_w}x{orig_h}: x = {x}");
      assert!(y.abs() <= tol, "{orig_w}x{orig_h}: y = {y}");
      assert!((w - orig_w as f32).abs() <= tol, "{orig_w}x{orig_h}: w = {w}");
      assert!((h - orig_h as f32).abs() <= tol, "{orig_w}x{orig_h}: h = {h}");
    }
  }

  #[test]
  fn target_is_filled_within_tolerance() {
    let params = LetterboxParams::compute(1023, 767, 640, 640).unwrap();
    let (resized_w, resized_h) = LetterboxParams::resized_extent(1023, 767, params.scale);
    let filled_w = resized_w as i32 + 2 * params.pad_x;
    let filled_h = resized_h as i32 + 2 * params.pad_y;
    assert!((640 - filled_w).abs() <= 1);
    assert!((640 - filled_h).abs() <= 1);
  }

  #[test]
  fn non_positive_scale_maps_nothing() {
    let params = LetterboxParams {
      scale: 0.0,
      pad_x: 0,
      pad_y: 0,
    };
    assert!(params.unmap_rect(10.0, 10.0, 5.0, 5.0).is_none());
  }
}
