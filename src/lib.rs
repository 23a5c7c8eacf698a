// 该文件是 Changfa （长发） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod decision;
pub mod frame;
pub mod input;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 取 URL 中的路径部分并做百分号解码，解码失败时保留原始路径
pub(crate) fn url_path(url: &url::Url) -> std::path::PathBuf {
  match urlencoding::decode(url.path()) {
    Ok(path) => std::path::PathBuf::from(path.as_ref()),
    Err(e) => {
      tracing::warn!("URL 路径解码失败, 使用原始路径 '{}': {}", url.path(), e);
      std::path::PathBuf::from(url.path())
    }
  }
}

/// 读取 URL 查询参数中第一个名为 `key` 的值
pub(crate) fn query_value(url: &url::Url, key: &str) -> Option<String> {
  url
    .query_pairs()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.into_owned())
}

/// URL 查询参数中是否出现了 `key`（不论取值）
pub(crate) fn query_flag(url: &url::Url, key: &str) -> bool {
  url.query_pairs().any(|(k, _)| k == key)
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;

  #[test]
  fn path_is_percent_decoded() {
    let url = Url::parse("image:///tmp/my%20face.png?font=/a.ttf&always").unwrap();
    assert_eq!(url_path(&url), std::path::PathBuf::from("/tmp/my face.png"));
    assert_eq!(query_value(&url, "font").as_deref(), Some("/a.ttf"));
    assert!(query_flag(&url, "always"));
    assert!(!query_flag(&url, "draw"));
  }

  #[test]
  fn undecodable_path_is_kept_verbatim() {
    let url = Url::parse("image:///tmp/%FF%FE.png").unwrap();
    assert_eq!(url_path(&url), std::path::PathBuf::from("/tmp/%FF%FE.png"));
  }
}
