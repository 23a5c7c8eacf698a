// 该文件是 Changfa （长发） 项目的一部分。
// src/frame.rs - 帧定义
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

use image::RgbImage;

pub const RGB_CHANNELS: usize = 3;

pub trait AsNhwcFrame {
  fn as_nhwc(&self) -> &[u8];
}

pub trait AsNhwcTensor {
  fn as_nhwc(&self) -> &[f32];
}

/// 解码后的 RGB 图像，HWC 排列，尺寸任意
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl RgbFrame {
  /// 以原始 HWC 数据构造帧，长度不匹配时返回 `None`
  pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
    if data.len() != RGB_CHANNELS * width as usize * height as usize {
      return None;
    }

    Some(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 任一空间维度为零即视为空图
  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  pub fn to_rgb_image(&self) -> Option<RgbImage> {
    RgbImage::from_raw(self.width, self.height, self.data.to_vec())
  }
}

impl From<RgbImage> for RgbFrame {
  fn from(image: RgbImage) -> Self {
    let (width, height) = image.dimensions();
    Self {
      width,
      height,
      data: image.into_raw().into_boxed_slice(),
    }
  }
}

impl AsNhwcFrame for RgbFrame {
  fn as_nhwc(&self) -> &[u8] {
    &self.data
  }
}

/// 模型输入张量，形状固定为 (1, H, W, 3)，取值 [0, 1]
#[derive(Debug, Clone)]
pub struct TensorNhwcFrame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> TensorNhwcFrame<W, H> {
  pub const LEN: usize = RGB_CHANNELS * W as usize * H as usize;

  /// 张量形状 (N, H, W, C)
  pub fn shape(&self) -> [usize; 4] {
    [1, H as usize, W as usize, RGB_CHANNELS]
  }

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

impl<const W: u32, const H: u32> TryFrom<Vec<f32>> for TensorNhwcFrame<W, H> {
  type Error = usize;

  /// 长度不匹配时返回实际长度
  fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
    if data.len() != Self::LEN {
      return Err(data.len());
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> AsNhwcTensor for TensorNhwcFrame<W, H> {
  fn as_nhwc(&self) -> &[f32] {
    &self.data
  }
}

/// 一次上传：来源名称 + 解码结果（解码失败时为 `None`）
#[derive(Debug, Clone)]
pub struct Upload {
  pub name: String,
  pub frame: Option<RgbFrame>,
}

impl Upload {
  pub fn new(name: impl Into<String>, frame: Option<RgbFrame>) -> Self {
    Self {
      name: name.into(),
      frame,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_length_must_match_shape() {
    assert!(RgbFrame::from_raw(2, 2, vec![0; 12]).is_some());
    assert!(RgbFrame::from_raw(2, 2, vec![0; 11]).is_none());
    assert!(RgbFrame::from_raw(0, 5, Vec::new()).is_some_and(|f| f.is_empty()));
  }

  #[test]
  fn rgb_image_round_trips_through_frame() {
    let image = RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8, y as u8, 7]));
    let frame = RgbFrame::from(image.clone());
    assert_eq!((frame.width(), frame.height()), (3, 2));
    assert_eq!(frame.as_nhwc()[3..6], [1, 0, 7]);
    assert_eq!(frame.to_rgb_image(), Some(image));
  }

  #[test]
  fn tensor_rejects_wrong_length() {
    assert_eq!(TensorNhwcFrame::<2, 2>::try_from(vec![0.0; 5]).err(), Some(5));
    let tensor = TensorNhwcFrame::<2, 2>::try_from(vec![0.5; 12]).unwrap();
    assert_eq!(tensor.shape(), [1, 2, 2, 3]);
  }
}
