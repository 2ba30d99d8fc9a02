// 该文件是 Qianli （千里眼） 项目的一部分。
// src/model.rs - 模型接口
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

/// 推理提供方接口。
///
/// 本库对模型或加速器不做任何假设：推理方消费一个平面浮点帧，
/// 返回一个带形状描述的扁平浮点缓冲，其余由后处理管线负责。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 推理输出的原始张量：扁平浮点缓冲加形状描述
#[derive(Debug, Clone)]
pub struct RawOutput {
  pub data: Box<[f32]>,
  pub dims: Box<[usize]>,
}

impl RawOutput {
  pub fn new(data: Vec<f32>, dims: Vec<usize>) -> Self {
    Self {
      data: data.into_boxed_slice(),
      dims: dims.into_boxed_slice(),
    }
  }
}

mod replay;
pub use self::replay::{ReplayModel, ReplayModelError};
