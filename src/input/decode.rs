// 该文件是 Changfa （长发） 项目的一部分。
// src/input/decode.rs - 上传内容解码
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

use std::{io::Cursor, path::Path};

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use thiserror::Error;
use tracing::{debug, warn};

use crate::frame::{RgbFrame, Upload};

/// 单次上传的大小上限：200 MiB
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("上传内容为空")]
  Empty,
  #[error("上传内容过大: {0} 字节")]
  TooLarge(usize),
  #[error("不支持的图像格式: {0}")]
  UnsupportedFormat(String),
  #[error("图像解码失败: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 文件扩展名是否为 jpg、jpeg 或 png（不区分大小写）
pub fn has_supported_extension(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
    })
    .unwrap_or(false)
}

/// 按内容识别格式并解码为 RGB 帧，只接受 PNG 与 JPEG。
///
/// 图像中带有 EXIF 方向标记时，先按标记旋转或翻转再输出。
pub fn decode_image(bytes: &[u8]) -> Result<RgbFrame, DecodeError> {
  if bytes.is_empty() {
    return Err(DecodeError::Empty);
  }
  if bytes.len() > MAX_UPLOAD_BYTES {
    return Err(DecodeError::TooLarge(bytes.len()));
  }

  let format = image::guess_format(bytes)?;
  match format {
    ImageFormat::Png | ImageFormat::Jpeg => {}
    other => return Err(DecodeError::UnsupportedFormat(format!("{:?}", other))),
  }

  let mut decoder = ImageReader::with_format(Cursor::new(bytes), format).into_decoder()?;
  let orientation = decoder.orientation()?;
  let mut image = DynamicImage::from_decoder(decoder)?;
  image.apply_orientation(orientation);
  debug!(
    "解码 {:?} 图像: {}x{}, 方向 {:?}",
    format,
    image.width(),
    image.height(),
    orientation
  );
  Ok(RgbFrame::from(image.to_rgb8()))
}

/// 解码失败时仍然产生一次上传，图像缺失交给流水线判为无效图像
pub fn decode_upload(name: impl Into<String>, bytes: &[u8]) -> Upload {
  let name = name.into();
  match decode_image(bytes) {
    Ok(frame) => Upload::new(name, Some(frame)),
    Err(e) => {
      warn!("{}: {}", name, e);
      Upload::new(name, None)
    }
  }
}
