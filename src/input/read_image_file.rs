// 该文件是 Qianli （千里眼） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{ImageReader, RgbImage, imageops};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::frame::PlanarFrame;
use crate::input::SourceFrame;
use crate::postprocess::{CoordinateMap, LetterboxParams};
use crate::{FromUrl, FromUrlWithScheme};

/// 信箱填充的灰度值
const PAD_VALUE: f32 = 114.0 / 255.0;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像加载错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("图像尺寸无效: {0}x{1}")]
  InvalidDimensions(u32, u32),
}

const READ_IMAGE_FILE_SCHEME: &str = "image";

/// 图像文件输入。
///
/// 解码一个图像文件，产生一帧模型输入。通过 URL 查询参数
/// `letterbox` 选择预处理路径：
///
/// - 默认（静态图片路径）：原图直接拉伸到正方形输入，坐标映射为
///   各轴独立缩放；
/// - `image:///path?letterbox`（模拟实时采集路径）：保持长宽比缩放
///   并对称填充，坐标映射为信箱逆变换。
pub struct ImageFileInput<const W: u32, const H: u32> {
  frame: Option<SourceFrame<W, H>>,
}

impl<const W: u32, const H: u32> FromUrlWithScheme for ImageFileInput<W, H> {
  const SCHEME: &'static str = READ_IMAGE_FILE_SCHEME;
}

impl<const W: u32, const H: u32> FromUrl for ImageFileInput<W, H> {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != READ_IMAGE_FILE_SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        READ_IMAGE_FILE_SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch);
    }

    let letterbox = url.query_pairs().any(|(k, _)| k == "letterbox");

    let path = url.path();
    let image: RgbImage = ImageReader::open(path)?.decode()?.into();
    let (orig_w, orig_h) = image.dimensions();
    debug!(
      "图像已加载: {} ({}x{}), letterbox = {}",
      path, orig_w, orig_h, letterbox
    );

    let frame = if letterbox {
      letterboxed_frame(&image)?
    } else {
      stretched_frame(&image)?
    };

    Ok(ImageFileInput { frame: Some(frame) })
  }
}

impl<const W: u32, const H: u32> Iterator for ImageFileInput<W, H> {
  type Item = SourceFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    self.frame.take()
  }
}

/// 静态图片路径：直接拉伸到 W×H，无填充
fn stretched_frame<const W: u32, const H: u32>(
  image: &RgbImage,
) -> Result<SourceFrame<W, H>, ImageFileInputError> {
  let (orig_w, orig_h) = image.dimensions();
  let map = CoordinateMap::uniform(orig_w, orig_h, W, H)
    .ok_or(ImageFileInputError::InvalidDimensions(orig_w, orig_h))?;

  let resized = imageops::resize(image, W, H, imageops::FilterType::Triangle);
  let mut frame = PlanarFrame::<W, H>::default();
  fill_planar::<W, H>(frame.as_mut(), &resized, W, H, 0, 0);

  Ok(SourceFrame { frame, map })
}

/// 实时采集风格路径：保持长宽比缩放并居中填充
fn letterboxed_frame<const W: u32, const H: u32>(
  image: &RgbImage,
) -> Result<SourceFrame<W, H>, ImageFileInputError> {
  let (orig_w, orig_h) = image.dimensions();
  let params = LetterboxParams::compute(orig_w, orig_h, W, H)
    .ok_or(ImageFileInputError::InvalidDimensions(orig_w, orig_h))?;
  let (resized_w, resized_h) = LetterboxParams::resized_extent(orig_w, orig_h, params.scale);

  let resized = imageops::resize(image, resized_w, resized_h, imageops::FilterType::Triangle);

  let mut frame = PlanarFrame::<W, H>::default();
  let data = frame.as_mut();
  data.fill(PAD_VALUE);
  fill_planar::<W, H>(data, &resized, resized_w, resized_h, params.pad_x, params.pad_y);

  Ok(SourceFrame {
    frame,
    map: CoordinateMap::Letterbox(params),
  })
}

/// 把 RGB 图像写入平面 CHW 缓冲的 (offset_x, offset_y) 处并归一化
fn fill_planar<const W: u32, const H: u32>(
  data: &mut [f32],
  image: &RgbImage,
  copy_w: u32,
  copy_h: u32,
  offset_x: i32,
  offset_y: i32,
) {
  let plane = (W as usize) * (H as usize);

  for y in 0..copy_h {
    let target_y = y as i64 + offset_y as i64;
    if target_y < 0 || target_y >= H as i64 {
      continue;
    }
    for x in 0..copy_w {
      let target_x = x as i64 + offset_x as i64;
      if target_x < 0 || target_x >= W as i64 {
        continue;
      }
      let pixel = image.get_pixel(x, y);
      let idx = (target_y as usize) * (W as usize) + (target_x as usize);
      data[idx] = pixel[0] as f32 / 255.0;
      data[plane + idx] = pixel[1] as f32 / 255.0;
      data[2 * plane + idx] = pixel[2] as f32 / 255.0;
    }
  }
}
