// 该文件是 Changfa （长发） 项目的一部分。
// src/preprocess.rs - 模型输入预处理
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

use image::{
  ImageBuffer, Rgb,
  imageops::{self, FilterType},
};
use thiserror::Error;
use tracing::debug;

use crate::frame::{AsNhwcFrame, RgbFrame, TensorNhwcFrame};

/// 两个分类模型的训练分辨率
pub const MODEL_INPUT_SIZE: u32 = 224;

pub type ModelInput = TensorNhwcFrame<MODEL_INPUT_SIZE, MODEL_INPUT_SIZE>;

#[derive(Error, Debug)]
pub enum PreprocessError {
  #[error("无效图像: {0}")]
  InvalidImage(String),
  #[error("张量长度不匹配: 期望 {expected}, 实际 {actual}")]
  TensorLength { expected: usize, actual: usize },
}

/// 将解码后的图像缩放到 224x224，归一化到 [0, 1] 并加上 batch 维度。
///
/// 图像缺失或任一维度为零时返回 [`PreprocessError::InvalidImage`]，
/// 不会进入缩放。
pub fn preprocess(frame: Option<&RgbFrame>) -> Result<ModelInput, PreprocessError> {
  let frame = frame.ok_or_else(|| PreprocessError::InvalidImage("图像缺失".to_string()))?;

  if frame.is_empty() {
    return Err(PreprocessError::InvalidImage(format!(
      "图像尺寸为零: {}x{}",
      frame.width(),
      frame.height()
    )));
  }

  let view = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(frame.width(), frame.height(), frame.as_nhwc())
    .ok_or_else(|| PreprocessError::InvalidImage("像素数据与尺寸不符".to_string()))?;

  debug!(
    "缩放图像: {}x{} -> {}x{}",
    frame.width(),
    frame.height(),
    MODEL_INPUT_SIZE,
    MODEL_INPUT_SIZE
  );
  // Triangle 即双线性插值
  let resized = imageops::resize(&view, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Triangle);

  let data: Vec<f32> = resized
    .into_raw()
    .into_iter()
    .map(|v| v as f32 / 255.0)
    .collect();

  ModelInput::try_from(data).map_err(|actual| PreprocessError::TensorLength {
    expected: ModelInput::LEN,
    actual,
  })
}
