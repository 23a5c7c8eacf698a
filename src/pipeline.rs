// 该文件是 Changfa （长发） 项目的一部分。
// src/pipeline.rs - 预处理、推理与判定流水线
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

use std::convert::Infallible;
use std::error::Error as StdError;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  decision::{Verdict, decide},
  frame::{RgbFrame, Upload},
  model::{AgeGenderPrediction, HairPrediction, Model, ModelCache},
  preprocess::{ModelInput, PreprocessError, preprocess},
};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PredictError {
  #[error("无效图像: {0}")]
  InvalidImage(String),
  #[error("预处理失败: {0}")]
  Preprocess(PreprocessError),
  #[error("年龄/性别模型推理失败: {0}")]
  AgeGender(BoxError),
  #[error("头发模型推理失败: {0}")]
  Hair(BoxError),
}

impl From<PreprocessError> for PredictError {
  fn from(err: PreprocessError) -> Self {
    match err {
      PreprocessError::InvalidImage(msg) => PredictError::InvalidImage(msg),
      other => PredictError::Preprocess(other),
    }
  }
}

/// 一次上传的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  Verdict(Verdict),
  InvalidImage,
  Failed(String),
}

impl Outcome {
  pub fn verdict(&self) -> Option<&Verdict> {
    match self {
      Outcome::Verdict(verdict) => Some(verdict),
      _ => None,
    }
  }

  pub fn status(&self) -> &'static str {
    match self {
      Outcome::Verdict(_) => "ok",
      Outcome::InvalidImage => "invalid_image",
      Outcome::Failed(_) => "failed",
    }
  }
}

impl From<Result<Verdict, PredictError>> for Outcome {
  fn from(result: Result<Verdict, PredictError>) -> Self {
    match result {
      Ok(verdict) => Outcome::Verdict(verdict),
      Err(PredictError::InvalidImage(_)) => Outcome::InvalidImage,
      Err(e) => Outcome::Failed(e.to_string()),
    }
  }
}

/// 预处理 → 两个模型 → 判定规则
pub struct Predictor<AG, H> {
  models: ModelCache<AG, H>,
}

impl<AG, H> Predictor<AG, H>
where
  AG: Model<Input = ModelInput, Output = AgeGenderPrediction>,
  AG::Error: StdError + Send + Sync + 'static,
  H: Model<Input = ModelInput, Output = HairPrediction>,
  H::Error: StdError + Send + Sync + 'static,
{
  pub fn new(models: ModelCache<AG, H>) -> Self {
    Self { models }
  }

  pub fn predict(&self, frame: Option<&RgbFrame>) -> Result<Verdict, PredictError> {
    let input = preprocess(frame)?;

    let AgeGenderPrediction { gender, age } = self
      .models
      .age_gender()
      .infer(&input)
      .map_err(|e| PredictError::AgeGender(Box::new(e)))?;

    let hair = self
      .models
      .hair()
      .infer(&input)
      .map_err(|e| PredictError::Hair(Box::new(e)))?;

    debug!(
      "原始输出: 性别 {:.4}, 年龄 {:?}, 长发 {:.4}",
      gender.0, age.0, hair.0
    );

    Ok(decide(gender, age, hair))
  }

  /// 流水线边界：所有错误都在这里被转换为 [`Outcome`]，不再向外传播
  pub fn assess(&self, upload: &Upload) -> Outcome {
    let outcome = Outcome::from(self.predict(upload.frame.as_ref()));
    match &outcome {
      Outcome::Verdict(verdict) => info!(
        "{}: 性别 {}, 年龄段 {}, 头发 {}",
        upload.name, verdict.gender, verdict.age, verdict.hair
      ),
      Outcome::InvalidImage => warn!("{}: 无法处理该图像", upload.name),
      Outcome::Failed(reason) => error!("{}: 预测失败: {}", upload.name, reason),
    }
    outcome
  }
}

impl<AG, H> Model for Predictor<AG, H>
where
  AG: Model<Input = ModelInput, Output = AgeGenderPrediction>,
  AG::Error: StdError + Send + Sync + 'static,
  H: Model<Input = ModelInput, Output = HairPrediction>,
  H::Error: StdError + Send + Sync + 'static,
{
  type Input = Upload;
  type Output = Outcome;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(self.assess(input))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use image::RgbImage;

  use super::*;
  use crate::{
    decision::{AgeGroup, Gender, HairLength},
    frame::AsNhwcTensor,
    model::{AgePrediction, GenderPrediction},
  };

  struct FixedAgeGender {
    output: AgeGenderPrediction,
    calls: AtomicUsize,
  }

  impl FixedAgeGender {
    fn new(gender: f32, age: [f32; 3]) -> Self {
      Self {
        output: AgeGenderPrediction {
          gender: GenderPrediction(gender),
          age: AgePrediction(age),
        },
        calls: AtomicUsize::new(0),
      }
    }
  }

  impl Model for FixedAgeGender {
    type Input = ModelInput;
    type Output = AgeGenderPrediction;
    type Error = std::io::Error;

    fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
      assert_eq!(input.shape(), [1, 224, 224, 3]);
      assert!(input.as_nhwc().iter().all(|v| (0.0..=1.0).contains(v)));
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self.output)
    }
  }

  struct FixedHair(Option<f32>);

  impl Model for FixedHair {
    type Input = ModelInput;
    type Output = HairPrediction;
    type Error = std::io::Error;

    fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
      self
        .0
        .map(HairPrediction)
        .ok_or_else(|| std::io::Error::other("hair session exploded"))
    }
  }

  fn predictor(gender: f32, age: [f32; 3], hair: Option<f32>) -> Predictor<FixedAgeGender, FixedHair> {
    Predictor::new(ModelCache::new(
      FixedAgeGender::new(gender, age),
      FixedHair(hair),
    ))
  }

  fn upload() -> Upload {
    let image = RgbImage::from_pixel(64, 48, image::Rgb([200, 150, 100]));
    Upload::new("face.png", Some(RgbFrame::from(image)))
  }

  #[test]
  fn hair_overrides_gender_end_to_end() {
    let outcome = predictor(0.9, [0.1, 0.8, 0.1], Some(0.7)).assess(&upload());
    assert_eq!(
      outcome,
      Outcome::Verdict(Verdict {
        gender: Gender::Female,
        age: AgeGroup::From20To30,
        hair: HairLength::Long,
      })
    );
    assert_eq!(outcome.status(), "ok");
  }

  #[test]
  fn other_buckets_pass_model_gender_through() {
    let outcome = predictor(0.9, [0.8, 0.1, 0.1], Some(0.7)).assess(&upload());
    assert_eq!(outcome.verdict().map(|v| v.gender), Some(Gender::Male));
  }

  #[test]
  fn absent_or_empty_image_skips_models() {
    let predictor = predictor(0.9, [0.1, 0.8, 0.1], Some(0.7));

    let outcome = predictor.assess(&Upload::new("broken.jpg", None));
    assert_eq!(outcome, Outcome::InvalidImage);

    let empty = RgbFrame::from_raw(0, 0, Vec::new()).unwrap();
    let outcome = predictor.assess(&Upload::new("empty.png", Some(empty)));
    assert_eq!(outcome, Outcome::InvalidImage);
    assert_eq!(outcome.status(), "invalid_image");

    assert_eq!(predictor.models.age_gender().calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn model_failure_degrades_to_failed_outcome() {
    let outcome = predictor(0.9, [0.1, 0.8, 0.1], None).assess(&upload());
    match outcome {
      Outcome::Failed(reason) => assert!(reason.contains("hair session exploded")),
      other => panic!("unexpected outcome: {:?}", other),
    }
  }

  #[test]
  fn model_trait_never_fails() {
    let predictor = predictor(0.1, [0.0, 0.0, 1.0], None);
    let outcome = predictor.infer(&upload()).unwrap();
    assert!(outcome.verdict().is_none());
  }
}
