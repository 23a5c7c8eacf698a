// 该文件是 Changfa （长发） 项目的一部分。
// src/input/stdin.rs - 标准输入
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

use std::io::{Read, Stdin};

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Upload,
  input::decode::{MAX_UPLOAD_BYTES, decode_upload},
};

const STDIN_UPLOAD_NAME: &str = "stdin";

#[derive(Error, Debug)]
pub enum StreamInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 把整个字节流当作一次上传
pub struct StreamInput<R> {
  reader: Option<R>,
  name: String,
}

impl<R: Read> StreamInput<R> {
  pub fn new(reader: R, name: impl Into<String>) -> Self {
    Self {
      reader: Some(reader),
      name: name.into(),
    }
  }
}

pub type StdinInput = StreamInput<Stdin>;

impl FromUrlWithScheme for StdinInput {
  const SCHEME: &'static str = "stdin";
}

impl FromUrl for StdinInput {
  type Error = StreamInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StreamInputError::SchemeMismatch);
    }
    Ok(StreamInput::new(std::io::stdin(), STDIN_UPLOAD_NAME))
  }
}

impl<R: Read> Iterator for StreamInput<R> {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    let reader = self.reader.take()?;
    info!("从 {} 读取上传内容", self.name);

    // 多读一个字节用于判断是否超限
    let mut bytes = Vec::new();
    if let Err(e) = reader
      .take(MAX_UPLOAD_BYTES as u64 + 1)
      .read_to_end(&mut bytes)
    {
      warn!("{}: 读取失败: {}", self.name, e);
      return Some(Upload::new(self.name.clone(), None));
    }

    Some(decode_upload(self.name.clone(), &bytes))
  }
}
