// 该文件是 Changfa （长发） 项目的一部分。
// src/input.rs - 图像上传输入
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

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Upload};

pub mod decode;

mod read_image_file;
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

mod directory;
pub use self::directory::{DirectoryInput, DirectoryInputError};

mod stdin;
pub use self::stdin::{StdinInput, StreamInput, StreamInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("图像文件输入错误: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("目录输入错误: {0}")]
  DirectoryInputError(#[from] DirectoryInputError),
  #[error("标准输入错误: {0}")]
  StreamInputError(#[from] StreamInputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  ReadImageFile(ImageFileInput),
  Directory(DirectoryInput),
  Stdin(StdinInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ImageFileInput::SCHEME => Ok(InputWrapper::ReadImageFile(ImageFileInput::from_url(url)?)),
      DirectoryInput::SCHEME => Ok(InputWrapper::Directory(DirectoryInput::from_url(url)?)),
      StdinInput::SCHEME => Ok(InputWrapper::Stdin(StdinInput::from_url(url)?)),
      other => Err(InputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl InputWrapper {
  /// 目录输入会产生多次上传，其余输入只有一次
  pub fn is_batch(&self) -> bool {
    matches!(self, InputWrapper::Directory(_))
  }
}

impl Iterator for InputWrapper {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::ReadImageFile(input) => input.next(),
      InputWrapper::Directory(input) => input.next(),
      InputWrapper::Stdin(input) => input.next(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dispatches_by_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
    let mut input = InputWrapper::from_url(&url).unwrap();
    assert!(input.is_batch());
    assert!(input.next().is_none());

    let input = InputWrapper::from_url(&Url::parse("stdin:").unwrap()).unwrap();
    assert!(!input.is_batch());

    assert!(matches!(
      InputWrapper::from_url(&Url::parse("v4l2:///dev/video0").unwrap()),
      Err(InputError::SchemeMismatch(_))
    ));
  }
}
