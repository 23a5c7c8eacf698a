// 该文件是 Changfa （长发） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{Datelike, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Upload,
  output::{
    Render,
    draw::{Draw, DrawError, Record},
  },
  pipeline::Outcome,
  query_flag, query_value, url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("绘制错误: {0}")]
  DrawError(#[from] DrawError),
}

/// `draw` 保存带横幅的图像，否则保存原图；两者都会写入 `.txt` 标签
pub enum DrawWrapper {
  Draw(Box<Draw>),
  Plain,
}

impl DrawWrapper {
  pub fn save_result(
    &self,
    path: &Path,
    upload: &Upload,
    outcome: &Outcome,
  ) -> Result<(), DirectoryRecordOutputError> {
    let image = match (self, upload.frame.as_ref()) {
      (DrawWrapper::Draw(draw), Some(frame)) => draw.annotate(frame, outcome),
      (DrawWrapper::Plain, Some(frame)) => frame.to_rgb_image(),
      (_, None) => None,
    };

    match image {
      Some(image) => image.save(path)?,
      None => warn!("{}: 没有可保存的图像, 只写入标签", upload.name),
    }
    Record.record(outcome, path)?;

    Ok(())
  }
}

pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: DrawWrapper,
  frame_counter: Mutex<u16>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let draw = if query_flag(uri, "draw") {
      DrawWrapper::Draw(Box::new(Draw::from_font_query(query_value(uri, "font"))?))
    } else {
      DrawWrapper::Plain
    };

    Ok(DirectoryRecordOutput {
      directory: url_path(uri),
      draw,
      frame_counter: Mutex::new(0),
      always: query_flag(uri, "always"),
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    let mut counter = self.frame_counter.lock();
    *counter = counter.wrapping_add(1);
    *counter
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl Render<Upload, Outcome> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, upload: &Upload, outcome: &Outcome) -> Result<(), Self::Error> {
    if !self.always && outcome.verdict().is_none() {
      debug!("{}: 没有判定结果, 跳过记录", upload.name);
      return Ok(());
    }

    let path = self.frame_path()?;
    self.draw.save_result(&path, upload, outcome)?;
    debug!("{}: 记录到 {}", upload.name, path.display());
    Ok(())
  }
}
