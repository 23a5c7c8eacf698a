// 该文件是 Changfa （长发） 项目的一部分。
// src/output/json_record.rs - JSON Lines 结果记录
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
  fs::{File, OpenOptions},
  io::Write,
  path::{Path, PathBuf},
};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Upload, output::Render, pipeline::Outcome, url_path};

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 一次上传对应的记录
pub fn outcome_record(upload: &Upload, outcome: &Outcome) -> Value {
  let mut record = json!({
    "source": upload.name,
    "status": outcome.status(),
    "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
  });

  match outcome {
    Outcome::Verdict(verdict) => {
      record["gender"] = json!(verdict.gender.as_str());
      record["gender_class"] = json!(verdict.gender.class_id());
      record["age_group"] = json!(verdict.age.as_str());
      record["age_class"] = json!(verdict.age.class_id());
      record["hair_length"] = json!(verdict.hair.as_str());
    }
    Outcome::InvalidImage => {}
    Outcome::Failed(reason) => {
      record["error"] = json!(reason);
    }
  }

  record
}

/// 以追加方式写入，每次上传一行
pub struct JsonRecordOutput {
  path: PathBuf,
  file: Mutex<File>,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonRecordOutputError::SchemeMismatch);
    }

    let path = url_path(url);
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Ok(JsonRecordOutput {
      path,
      file: Mutex::new(file),
    })
  }
}

impl JsonRecordOutput {
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Render<Upload, Outcome> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn render_result(&self, upload: &Upload, outcome: &Outcome) -> Result<(), Self::Error> {
    let line = serde_json::to_string(&outcome_record(upload, outcome))?;
    let mut file = self.file.lock();
    writeln!(file, "{}", line)?;
    file.flush()?;
    debug!("写入记录到 {}", self.path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decision::{AgeGroup, Gender, HairLength, Verdict};

  #[test]
  fn appends_one_line_per_upload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("results.jsonl");
    let url = Url::parse(&format!("json://{}", path.display())).unwrap();

    let output = JsonRecordOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), path.as_path());

    let verdict = Outcome::Verdict(Verdict {
      gender: Gender::Male,
      age: AgeGroup::Over30,
      hair: HairLength::Short,
    });
    output
      .render_result(&Upload::new("a.png", None), &verdict)
      .unwrap();
    output
      .render_result(&Upload::new("b.png", None), &Outcome::Failed("boom".into()))
      .unwrap();
    drop(output);

    // 重新打开时继续追加
    let output = JsonRecordOutput::from_url(&url).unwrap();
    output
      .render_result(&Upload::new("c.jpg", None), &Outcome::InvalidImage)
      .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let records: Vec<Value> = content
      .lines()
      .map(|line| serde_json::from_str(line).unwrap())
      .collect();
    assert_eq!(records.len(), 3);

    assert_eq!(records[0]["source"], "a.png");
    assert_eq!(records[0]["status"], "ok");
    assert_eq!(records[0]["gender"], "Male");
    assert_eq!(records[0]["gender_class"], 1);
    assert_eq!(records[0]["age_group"], ">30");
    assert_eq!(records[0]["age_class"], 2);
    assert_eq!(records[0]["hair_length"], "short");

    assert_eq!(records[1]["status"], "failed");
    assert_eq!(records[1]["error"], "boom");
    assert!(records[1].get("gender").is_none());

    assert_eq!(records[2]["status"], "invalid_image");
    assert!(records[2]["timestamp"].as_str().unwrap().ends_with('Z'));
  }
}
