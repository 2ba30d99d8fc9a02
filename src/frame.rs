// 该文件是 Qianli （千里眼） 项目的一部分。
// src/frame.rs - 平面浮点帧定义
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

const RGB_CHANNELS: usize = 3;

/// 推理提供方消费的帧格式：平面 CHW 排布、归一化到 [0, 1] 的浮点缓冲
pub trait AsPlanarFrame<const W: u32, const H: u32> {
  fn as_planar(&self) -> &[f32];
}

/// 固定尺寸的平面 CHW 浮点帧
#[derive(Debug, Clone)]
pub struct PlanarFrame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> From<Vec<f32>> for PlanarFrame<W, H> {
  fn from(data: Vec<f32>) -> Self {
    if data.len() != (RGB_CHANNELS * W as usize * H as usize) {
      panic!(
        "数据长度不匹配: 期望长度 {}, 实际长度 {}",
        RGB_CHANNELS * W as usize * H as usize,
        data.len()
      );
    }

    Self {
      data: data.into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> Default for PlanarFrame<W, H> {
  fn default() -> Self {
    let size = RGB_CHANNELS * (W as usize) * (H as usize);
    let data = vec![0.0f32; size].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> PlanarFrame<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }
}

impl<const W: u32, const H: u32> AsMut<[f32]> for PlanarFrame<W, H> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsPlanarFrame<W, H> for PlanarFrame<W, H> {
  fn as_planar(&self) -> &[f32] {
    &self.data
  }
}
