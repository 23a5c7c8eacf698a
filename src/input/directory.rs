// 该文件是 Changfa （长发） 项目的一部分。
// src/input/directory.rs - 目录批量输入
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

use std::{
  collections::VecDeque,
  path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Upload,
  input::{
    decode::{MAX_UPLOAD_BYTES, decode_upload, has_supported_extension},
    read_image_file::upload_name,
  },
  url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("不是目录: {0}")]
  NotADirectory(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 目录中的每个 jpg/jpeg/png 文件按文件名排序，逐个读取解码
pub struct DirectoryInput {
  directory: PathBuf,
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = DirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryInputError::SchemeMismatch);
    }

    let directory = url_path(url);
    if !directory.is_dir() {
      return Err(DirectoryInputError::NotADirectory(
        directory.display().to_string(),
      ));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      if path.is_file() && has_supported_extension(&path) {
        files.push(path);
      }
    }
    files.sort();

    info!("目录 {} 中共有 {} 张图像", directory.display(), files.len());

    Ok(DirectoryInput {
      directory,
      pending: files.into(),
    })
  }
}

impl DirectoryInput {
  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn remaining(&self) -> usize {
    self.pending.len()
  }
}

impl Iterator for DirectoryInput {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    let path = self.pending.pop_front()?;
    let name = upload_name(&path);

    let bytes = match std::fs::metadata(&path) {
      Ok(meta) if meta.len() > MAX_UPLOAD_BYTES as u64 => {
        warn!("{}: 文件过大, 跳过解码", name);
        return Some(Upload::new(name, None));
      }
      Ok(_) => std::fs::read(&path),
      Err(e) => Err(e),
    };

    match bytes {
      Ok(bytes) => Some(decode_upload(name, &bytes)),
      Err(e) => {
        warn!("{}: 读取失败: {}", name, e);
        Some(Upload::new(name, None))
      }
    }
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.pending.len(), Some(self.pending.len()))
  }
}

#[cfg(test)]
mod tests {
  use image::{ImageFormat, Rgb, RgbImage};

  use super::*;
  use crate::input::decode::tests::encode;

  #[test]
  fn lists_supported_files_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    let image = RgbImage::from_pixel(3, 3, Rgb([9, 9, 9]));
    std::fs::write(dir.path().join("b.png"), encode(&image, ImageFormat::Png)).unwrap();
    std::fs::write(dir.path().join("a.JPG"), encode(&image, ImageFormat::Jpeg)).unwrap();
    std::fs::write(dir.path().join("c.jpeg"), b"corrupted").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let url = Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
    let input = DirectoryInput::from_url(&url).unwrap();
    assert_eq!(input.directory(), dir.path());
    assert_eq!(input.remaining(), 3);

    let uploads: Vec<_> = input.collect();
    let names: Vec<_> = uploads.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["a.JPG", "b.png", "c.jpeg"]);
    assert!(uploads[0].frame.is_some());
    assert!(uploads[1].frame.is_some());
    assert!(uploads[2].frame.is_none());
  }

  #[test]
  fn file_path_is_not_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("x.png");
    std::fs::write(&file, b"x").unwrap();
    let url = Url::parse(&format!("folder://{}", file.display())).unwrap();
    assert!(matches!(
      DirectoryInput::from_url(&url),
      Err(DirectoryInputError::NotADirectory(_))
    ));
  }
}
