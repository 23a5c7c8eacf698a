// 该文件是 Changfa （长发） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 模型
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

use std::path::PathBuf;

use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::AsNhwcTensor,
  model::{AgeGenderPrediction, AgePrediction, GenderPrediction, HairPrediction, Model, ModelCache},
  preprocess::ModelInput,
  query_value, url_path,
};

const MODEL_NUM_INPUTS: usize = 1;
const AGE_GENDER_NUM_OUTPUTS: usize = 2;
const HAIR_NUM_OUTPUTS: usize = 1;
const AGE_CLASS_NUM: usize = 3;

#[derive(Error, Debug)]
pub enum OnnxModelError {
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型文件不存在: {0}")]
  ModelNotFound(String),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(String),
  #[error("模型输出无效: {0}")]
  OutputInvalid(String),
}

impl OnnxModelError {
  fn ort(context: &str, e: impl std::fmt::Display) -> Self {
    OnnxModelError::OrtError(format!("{}: {}", context, e))
  }
}

pub struct OnnxModelBuilder {
  model_path: PathBuf,
  intra_threads: Option<usize>,
  optimization_level: u8,
}

impl FromUrlWithScheme for OnnxModelBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxModelBuilder {
  type Error = OnnxModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OnnxModelError::ModelPathError(format!(
        "模型路径必须使用 {} 方案, 实际为 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    if url.path().is_empty() {
      return Err(OnnxModelError::ModelPathError(format!(
        "模型路径为空: {}",
        url
      )));
    }

    let intra_threads = match query_value(url, "threads") {
      Some(v) => Some(v.parse::<usize>().map_err(|e| {
        OnnxModelError::ModelPathError(format!("threads 参数无效 '{}': {}", v, e))
      })?),
      None => None,
    };

    let optimization_level = match query_value(url, "opt") {
      Some(v) => match v.parse::<u8>() {
        Ok(level @ 0..=3) => level,
        _ => {
          return Err(OnnxModelError::ModelPathError(format!(
            "opt 参数必须在 0 到 3 之间, 实际为 '{}'",
            v
          )));
        }
      },
      None => 3,
    };

    Ok(OnnxModelBuilder {
      model_path: url_path(url),
      intra_threads,
      optimization_level,
    })
  }
}

impl OnnxModelBuilder {
  pub fn model_path(&self) -> &std::path::Path {
    &self.model_path
  }

  fn graph_optimization_level(&self) -> GraphOptimizationLevel {
    match self.optimization_level {
      0 => GraphOptimizationLevel::Disable,
      1 => GraphOptimizationLevel::Level1,
      2 => GraphOptimizationLevel::Level2,
      _ => GraphOptimizationLevel::Level3,
    }
  }

  fn build_session(&self, num_outputs: usize) -> Result<OnnxSession, OnnxModelError> {
    let model_display = self.model_path.display().to_string();
    if !self.model_path.exists() {
      return Err(OnnxModelError::ModelNotFound(model_display));
    }

    info!("加载模型文件: {}", model_display);
    let mut builder = Session::builder()
      .map_err(|e| OnnxModelError::ort("创建会话构建器失败", e))?
      .with_optimization_level(self.graph_optimization_level())
      .map_err(|e| OnnxModelError::ort("设置优化级别失败", e))?;
    if let Some(threads) = self.intra_threads {
      debug!("推理线程数: {}", threads);
      builder = builder
        .with_intra_threads(threads)
        .map_err(|e| OnnxModelError::ort("设置推理线程数失败", e))?;
    }
    let session = builder
      .commit_from_file(&self.model_path)
      .map_err(|e| OnnxModelError::ort("加载模型失败", e))?;

    if session.inputs.len() != MODEL_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        MODEL_NUM_INPUTS,
        session.inputs.len()
      );
      return Err(OnnxModelError::ModelInvalid(format!(
        "{}: 预期模型输入数量为 {}, 实际为 {}",
        model_display,
        MODEL_NUM_INPUTS,
        session.inputs.len()
      )));
    }

    if session.outputs.len() != num_outputs {
      error!(
        "预期模型输出数量为 {}, 实际为 {}",
        num_outputs,
        session.outputs.len()
      );
      return Err(OnnxModelError::ModelInvalid(format!(
        "{}: 预期模型输出数量为 {}, 实际为 {}",
        model_display,
        num_outputs,
        session.outputs.len()
      )));
    }

    let input_name = session.inputs[0].name.clone();
    let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
    debug!("模型输入: '{}'", input_name);
    for (i, name) in output_names.iter().enumerate() {
      debug!("模型输出[{}]: '{}'", i, name);
    }
    info!("模型加载完成: {}", model_display);

    Ok(OnnxSession {
      session: Mutex::new(session),
      input_name,
      output_names,
    })
  }

  pub fn build_age_gender(&self) -> Result<OnnxAgeGender, OnnxModelError> {
    Ok(OnnxAgeGender {
      inner: self.build_session(AGE_GENDER_NUM_OUTPUTS)?,
    })
  }

  pub fn build_hair(&self) -> Result<OnnxHair, OnnxModelError> {
    Ok(OnnxHair {
      inner: self.build_session(HAIR_NUM_OUTPUTS)?,
    })
  }
}

/// 在进程启动时加载两个模型，任何一个失败都视为致命错误
pub fn load_model_cache(
  age_gender: &Url,
  hair: &Url,
) -> Result<ModelCache<OnnxAgeGender, OnnxHair>, OnnxModelError> {
  let age_gender = OnnxModelBuilder::from_url(age_gender)?.build_age_gender()?;
  let hair = OnnxModelBuilder::from_url(hair)?.build_hair()?;
  Ok(ModelCache::new(age_gender, hair))
}

struct OnnxSession {
  // ort 的 run 需要独占会话
  session: Mutex<Session>,
  input_name: String,
  output_names: Vec<String>,
}

impl OnnxSession {
  /// 运行一次推理，按输出顺序返回展平后的各输出张量
  fn run(&self, input: &ModelInput) -> Result<Vec<Vec<f32>>, OnnxModelError> {
    let tensor = Tensor::from_array((
      input.shape().to_vec(),
      input.as_nhwc().to_vec().into_boxed_slice(),
    ))
    .map_err(|e| OnnxModelError::ort("创建输入张量失败", e))?;

    let mut session = self.session.lock();
    debug!("执行模型推理");
    let outputs = session
      .run(ort::inputs![self.input_name.as_str() => tensor])
      .map_err(|e| OnnxModelError::ort("推理失败", e))?;

    let mut tensors = Vec::with_capacity(self.output_names.len());
    for name in &self.output_names {
      let value = outputs.get(name.as_str()).ok_or_else(|| {
        OnnxModelError::OutputInvalid(format!("缺少输出 '{}'", name))
      })?;
      let (shape, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| OnnxModelError::ort("提取输出张量失败", e))?;
      debug!("输出 '{}' 形状: {:?}", name, shape);
      tensors.push(data.to_vec());
    }

    Ok(tensors)
  }
}

pub struct OnnxAgeGender {
  inner: OnnxSession,
}

pub struct OnnxHair {
  inner: OnnxSession,
}

/// 按元素数量区分性别输出 (1, 1) 与年龄输出 (1, 3)，
/// 导出工具并不保证两个输出的顺序
fn match_gender_age(first: &[f32], second: &[f32]) -> Option<(f32, [f32; AGE_CLASS_NUM])> {
  match (first, second) {
    (&[gender], &[a0, a1, a2]) => Some((gender, [a0, a1, a2])),
    (&[a0, a1, a2], &[gender]) => {
      debug!("年龄/性别输出顺序交换");
      Some((gender, [a0, a1, a2]))
    }
    _ => None,
  }
}

impl Model for OnnxAgeGender {
  type Input = ModelInput;
  type Output = AgeGenderPrediction;
  type Error = OnnxModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let outputs = self.inner.run(input)?;
    let (first, second) = match outputs.as_slice() {
      [first, second] => (first, second),
      _ => {
        return Err(OnnxModelError::OutputInvalid(format!(
          "年龄/性别模型输出数量为 {}",
          outputs.len()
        )));
      }
    };

    let (gender, age) = match_gender_age(first, second).ok_or_else(|| {
      OnnxModelError::OutputInvalid(format!(
        "年龄/性别模型输出大小不匹配: {} 与 {}, 期望 1 与 {}",
        first.len(),
        second.len(),
        AGE_CLASS_NUM
      ))
    })?;
    debug!("性别: {:.4}, 年龄: {:?}", gender, age);

    Ok(AgeGenderPrediction {
      gender: GenderPrediction(gender),
      age: AgePrediction(age),
    })
  }
}

impl Model for OnnxHair {
  type Input = ModelInput;
  type Output = HairPrediction;
  type Error = OnnxModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let outputs = self.inner.run(input)?;
    match outputs.as_slice() {
      [output] => match output.as_slice() {
        &[hair] => {
          debug!("长发: {:.4}", hair);
          Ok(HairPrediction(hair))
        }
        other => Err(OnnxModelError::OutputInvalid(format!(
          "头发模型输出大小为 {}, 期望 1",
          other.len()
        ))),
      },
      _ => Err(OnnxModelError::OutputInvalid(format!(
        "头发模型输出数量为 {}",
        outputs.len()
      ))),
    }
  }
}
