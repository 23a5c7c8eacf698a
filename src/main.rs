// 该文件是 Changfa （长发） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use changfa::{
  FromUrl,
  input::InputWrapper,
  model::load_model_cache,
  output::OutputWrapper,
  pipeline::Predictor,
  task::{ContinuousTask, OneShotTask, Task},
};

fn main() -> Result<()> {
  let args = args::Args::parse();

  let filter =
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
  tracing_subscriber::fmt().with_env_filter(filter).init();

  info!("年龄/性别模型: {}", args.age_gender_model);
  info!("头发模型: {}", args.hair_model);
  info!("输入来源: {}", args.input);
  info!("输出方式: {}", args.output);

  // 模型加载失败直接退出，不处理任何上传
  let models = load_model_cache(&args.age_gender_model, &args.hair_model)
    .context("模型加载失败")?;
  let predictor = Predictor::new(models);

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  if input.is_batch() {
    ContinuousTask::default()
      .with_max_count(args.max_images)
      .run_task(input, predictor, output)?;
  } else {
    OneShotTask.run_task(input, predictor, output)?;
  }

  Ok(())
}
