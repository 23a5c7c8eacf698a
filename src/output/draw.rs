// 该文件是 Changfa （长发） 项目的一部分。
// src/output/draw.rs - 判定结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::info;

use crate::{
  frame::RgbFrame,
  output::UNAVAILABLE_MESSAGE,
  pipeline::Outcome,
};

// 横幅常量
const BANNER_FONT_SIZE: f32 = 20.0;
const BANNER_HEIGHT: u32 = 28;
const BANNER_TEXT_PADDING: i32 = 4;
const TEXT_COLOR: [u8; 3] = [255, 255, 255];
const VERDICT_COLOR: [u8; 3] = [0, 128, 0]; // 绿色
const INVALID_COLOR: [u8; 3] = [255, 140, 0]; // 橙色
const FAILED_COLOR: [u8; 3] = [200, 0, 0]; // 红色

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("无法读取字体文件: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无效的字体文件: {0}")]
  InvalidFont(String),
}

/// 横幅上的单行文字
pub fn banner_text(outcome: &Outcome) -> String {
  match outcome {
    Outcome::Verdict(verdict) => format!(
      "{} | {} | {} hair",
      verdict.gender, verdict.age, verdict.hair
    ),
    Outcome::InvalidImage => UNAVAILABLE_MESSAGE.to_string(),
    Outcome::Failed(reason) => format!("Prediction failed: {}", reason),
  }
}

fn banner_color(outcome: &Outcome) -> [u8; 3] {
  match outcome {
    Outcome::Verdict(_) => VERDICT_COLOR,
    Outcome::InvalidImage => INVALID_COLOR,
    Outcome::Failed(_) => FAILED_COLOR,
  }
}

/// 在图像底部绘制结果横幅，没有字体时只绘制色条
pub struct Draw {
  font: Option<FontArc>,
  font_size: f32,
  banner_height: u32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      font_size: BANNER_FONT_SIZE,
      banner_height: BANNER_HEIGHT,
    }
  }
}

impl Draw {
  pub fn with_font_path(font_path: &Path) -> Result<Self, DrawError> {
    let font_data = std::fs::read(font_path)?;
    let font = FontArc::try_from_vec(font_data)
      .map_err(|_| DrawError::InvalidFont(font_path.display().to_string()))?;
    info!("加载字体: {}", font_path.display());

    Ok(Self {
      font: Some(font),
      ..Self::default()
    })
  }

  /// 由 `font` 查询参数决定是否加载字体
  pub fn from_font_query(font_path: Option<String>) -> Result<Self, DrawError> {
    match font_path {
      Some(path) => Self::with_font_path(Path::new(&path)),
      None => Ok(Self::default()),
    }
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  pub fn draw_banner(&self, image: &mut RgbImage, outcome: &Outcome) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return;
    }

    let banner_height = self.banner_height.min(height);
    let top = (height - banner_height) as i32;
    let rect = Rect::at(0, top).of_size(width, banner_height);
    draw_filled_rect_mut(image, rect, Rgb(banner_color(outcome)));

    if let Some(font) = &self.font {
      draw_text_mut(
        image,
        Rgb(TEXT_COLOR),
        BANNER_TEXT_PADDING,
        top + BANNER_TEXT_PADDING.min(banner_height as i32 / 2),
        PxScale::from(self.font_size),
        font,
        &banner_text(outcome),
      );
    }
  }

  /// 复制帧并绘制横幅
  pub fn annotate(&self, frame: &RgbFrame, outcome: &Outcome) -> Option<RgbImage> {
    let mut image = frame.to_rgb_image()?;
    self.draw_banner(&mut image, outcome);
    Some(image)
  }
}

/// 与图像同名的 `.txt` 标签记录
pub struct Record;

impl Record {
  pub fn record_line(outcome: &Outcome) -> String {
    match outcome {
      Outcome::Verdict(verdict) => format!(
        "{}, {}, {}, {}, {}, {}",
        outcome.status(),
        verdict.gender,
        verdict.gender.class_id(),
        verdict.age,
        verdict.age.class_id(),
        verdict.hair
      ),
      Outcome::InvalidImage => outcome.status().to_string(),
      Outcome::Failed(reason) => format!("{}, {}", outcome.status(), reason),
    }
  }

  pub fn record(&self, outcome: &Outcome, path: &Path) -> Result<(), std::io::Error> {
    std::fs::write(path.with_extension("txt"), Self::record_line(outcome))
  }
}
