// 该文件是 Changfa （长发） 项目的一部分。
// src/output/console.rs - 终端输出
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

use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Upload,
  output::{Render, UNAVAILABLE_MESSAGE},
  pipeline::Outcome,
};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 展示给用户的文本行
pub fn outcome_lines(outcome: &Outcome) -> Vec<String> {
  match outcome {
    Outcome::Verdict(verdict) => vec![
      format!("Gender: {}", verdict.gender),
      format!("Age Group: {}", verdict.age),
      format!("Hair Length: {}", verdict.hair),
    ],
    Outcome::InvalidImage => vec![UNAVAILABLE_MESSAGE.to_string()],
    Outcome::Failed(reason) => vec![
      format!("Prediction failed: {}", reason),
      UNAVAILABLE_MESSAGE.to_string(),
    ],
  }
}

pub struct ConsoleOutput {
  with_name: bool,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch);
    }
    Ok(ConsoleOutput {
      with_name: crate::query_flag(url, "name"),
    })
  }
}

impl ConsoleOutput {
  fn write_to(
    &self,
    out: &mut impl Write,
    upload: &Upload,
    outcome: &Outcome,
  ) -> Result<(), std::io::Error> {
    if self.with_name {
      writeln!(out, "[{}]", upload.name)?;
    }
    for line in outcome_lines(outcome) {
      writeln!(out, "{}", line)?;
    }
    out.flush()
  }
}

impl Render<Upload, Outcome> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, upload: &Upload, outcome: &Outcome) -> Result<(), Self::Error> {
    let stdout = std::io::stdout();
    self.write_to(&mut stdout.lock(), upload, outcome)?;
    Ok(())
  }
}
