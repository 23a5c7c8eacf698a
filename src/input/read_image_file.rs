// 该文件是 Changfa （长发） 项目的一部分。
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Upload,
  input::decode::{MAX_UPLOAD_BYTES, decode_upload, has_supported_extension},
  url_path,
};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("不支持的文件类型: {0}")]
  UnsupportedExtension(String),
  #[error("文件过大: {0}")]
  TooLarge(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 文件名作为上传的名称，取不到时退回完整路径
pub(crate) fn upload_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

pub struct ImageFileInput {
  path: PathBuf,
  upload: Option<Upload>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch);
    }

    let path = url_path(url);
    if !has_supported_extension(&path) {
      return Err(ImageFileInputError::UnsupportedExtension(
        path.display().to_string(),
      ));
    }

    let size = std::fs::metadata(&path)?.len();
    if size > MAX_UPLOAD_BYTES as u64 {
      return Err(ImageFileInputError::TooLarge(path.display().to_string()));
    }

    info!("读取图像文件: {}", path.display());
    let bytes = std::fs::read(&path)?;
    let upload = decode_upload(upload_name(&path), &bytes);

    Ok(ImageFileInput {
      path,
      upload: Some(upload),
    })
  }
}

impl ImageFileInput {
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Iterator for ImageFileInput {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    self.upload.take()
  }
}

#[cfg(test)]
mod tests {
  use image::{ImageFormat, Rgb, RgbImage};

  use super::*;
  use crate::input::decode::tests::encode;

  fn file_url(path: &Path) -> Url {
    Url::parse(&format!("image://{}", path.display())).unwrap()
  }

  #[test]
  fn yields_exactly_one_upload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.png");
    let image = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
    std::fs::write(&path, encode(&image, ImageFormat::Png)).unwrap();

    let mut input = ImageFileInput::from_url(&file_url(&path)).unwrap();
    assert_eq!(input.path(), path.as_path());
    let upload = input.next().unwrap();
    assert_eq!(upload.name, "face.png");
    assert!(upload.frame.is_some());
    assert!(input.next().is_none());
  }

  #[test]
  fn corrupt_file_becomes_absent_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"not a jpeg at all").unwrap();

    let upload = ImageFileInput::from_url(&file_url(&path))
      .unwrap()
      .next()
      .unwrap();
    assert!(upload.frame.is_none());
  }

  #[test]
  fn rejects_wrong_extension_scheme_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let gif = dir.path().join("anim.gif");
    std::fs::write(&gif, b"GIF89a").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&file_url(&gif)),
      Err(ImageFileInputError::UnsupportedExtension(_))
    ));

    let missing = dir.path().join("missing.png");
    assert!(matches!(
      ImageFileInput::from_url(&file_url(&missing)),
      Err(ImageFileInputError::IoError(_))
    ));

    let url = Url::parse("folder:///tmp/a.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemeMismatch)
    ));
  }
}
