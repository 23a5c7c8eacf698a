// 该文件是 Changfa （长发） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Changfa 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 年龄/性别模型
  /// 例如: onnx:///models/age_gender.onnx?threads=2&opt=3
  #[arg(long, value_name = "MODEL", env = "CHANGFA_AGE_GENDER_MODEL")]
  pub age_gender_model: Url,

  /// 头发长度模型
  #[arg(long, value_name = "MODEL", env = "CHANGFA_HAIR_MODEL")]
  pub hair_model: Url,

  /// 输入来源
  /// 支持格式:
  /// - 图片: image:///path/to/face.jpg（jpg、jpeg、png）
  /// - 目录: folder:///path/to/dir
  /// - 标准输入: stdin:
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出方式
  /// 支持格式:
  /// - 终端: console:
  /// - 记录: json:///path/to/results.jsonl
  /// - 图片: image:///path/to/out.png?font=/path/to/font.ttf
  /// - 目录: folder:///path/to/dir?draw&always
  #[arg(long, value_name = "OUTPUT", default_value = "console:")]
  pub output: Url,

  /// 目录输入时最多处理的图像数量
  #[arg(long, value_name = "COUNT")]
  pub max_images: Option<usize>,

  /// 未设置 RUST_LOG 时使用的日志级别
  #[arg(long, value_name = "LEVEL", default_value = "info")]
  pub log_level: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_urls_and_defaults() {
    let args = Args::try_parse_from([
      "changfa",
      "--age-gender-model",
      "onnx:///m/ag.onnx",
      "--hair-model",
      "onnx:///m/hair.onnx?threads=1",
      "--input",
      "folder:///photos",
      "--max-images",
      "5",
    ])
    .unwrap();

    assert_eq!(args.age_gender_model.path(), "/m/ag.onnx");
    assert_eq!(args.hair_model.query(), Some("threads=1"));
    assert_eq!(args.input.scheme(), "folder");
    assert_eq!(args.output.scheme(), "console");
    assert_eq!(args.max_images, Some(5));
    assert_eq!(args.log_level, "info");
  }

  #[test]
  fn rejects_non_url_input() {
    let result = Args::try_parse_from([
      "changfa",
      "--age-gender-model",
      "onnx:///m/ag.onnx",
      "--hair-model",
      "onnx:///m/hair.onnx",
      "--input",
      "relative/path.png",
    ]);
    assert!(result.is_err());
  }
}
