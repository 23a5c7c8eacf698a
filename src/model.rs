// 该文件是 Changfa （长发） 项目的一部分。
// src/model.rs - 模型
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

use std::sync::Arc;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 男性（类别 1）的概率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderPrediction(pub f32);

/// 三个年龄段 `<20`、`20–30`、`>30` 的概率分布
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgePrediction(pub [f32; 3]);

/// 长发的概率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HairPrediction(pub f32);

/// 年龄/性别模型一次推理的两个输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeGenderPrediction {
  pub gender: GenderPrediction,
  pub age: AgePrediction,
}

/// 进程级模型缓存。
///
/// 启动时构造一次，之后只读共享；克隆只复制 `Arc`，不会重新加载模型。
/// 缓存的生命周期即进程的生命周期，没有淘汰也没有显式释放。
#[derive(Debug)]
pub struct ModelCache<AG, H> {
  age_gender: Arc<AG>,
  hair: Arc<H>,
}

impl<AG, H> Clone for ModelCache<AG, H> {
  fn clone(&self) -> Self {
    Self {
      age_gender: Arc::clone(&self.age_gender),
      hair: Arc::clone(&self.hair),
    }
  }
}

impl<AG, H> ModelCache<AG, H> {
  pub fn new(age_gender: AG, hair: H) -> Self {
    Self {
      age_gender: Arc::new(age_gender),
      hair: Arc::new(hair),
    }
  }

  pub fn age_gender(&self) -> &AG {
    &self.age_gender
  }

  pub fn hair(&self) -> &H {
    &self.hair
  }
}

#[cfg(feature = "model_onnx")]
mod onnx;
#[cfg(feature = "model_onnx")]
pub use self::onnx::{
  OnnxAgeGender, OnnxHair, OnnxModelBuilder, OnnxModelError, load_model_cache,
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_loaded_models() {
    let cache = ModelCache::new(String::from("age-gender"), 7u8);
    let clone = cache.clone();
    assert!(std::ptr::eq(cache.age_gender(), clone.age_gender()));
    assert!(std::ptr::eq(cache.hair(), clone.hair()));
  }
}
