// 该文件是 Changfa （长发） 项目的一部分。
// src/decision.rs - 判定规则
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

use std::fmt;

use crate::model::{AgePrediction, GenderPrediction, HairPrediction};

const BINARY_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
  Female,
  Male,
}

impl Gender {
  pub fn class_id(self) -> u8 {
    match self {
      Gender::Female => 0,
      Gender::Male => 1,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Gender::Female => "Female",
      Gender::Male => "Male",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeGroup {
  Under20,
  From20To30,
  Over30,
}

impl AgeGroup {
  const ALL: [AgeGroup; 3] = [AgeGroup::Under20, AgeGroup::From20To30, AgeGroup::Over30];

  pub fn class_id(self) -> u8 {
    match self {
      AgeGroup::Under20 => 0,
      AgeGroup::From20To30 => 1,
      AgeGroup::Over30 => 2,
    }
  }

  pub fn from_class_id(id: usize) -> Option<Self> {
    Self::ALL.get(id).copied()
  }

  pub fn as_str(self) -> &'static str {
    match self {
      AgeGroup::Under20 => "<20",
      AgeGroup::From20To30 => "20–30",
      AgeGroup::Over30 => ">30",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HairLength {
  Short,
  Long,
}

impl HairLength {
  pub fn as_str(self) -> &'static str {
    match self {
      HairLength::Short => "short",
      HairLength::Long => "long",
    }
  }
}

macro_rules! display_as_str {
  ($($ty:ty),*) => {
    $(impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    })*
  };
}

display_as_str!(Gender, AgeGroup, HairLength);

/// 最终展示给用户的三项标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Verdict {
  pub gender: Gender,
  pub age: AgeGroup,
  pub hair: HairLength,
}

/// 下标最小者胜出；出现 NaN 时返回第一个 NaN 的下标
fn argmax(scores: &[f32; 3]) -> usize {
  if let Some(first_nan) = scores.iter().position(|score| score.is_nan()) {
    return first_nan;
  }

  let mut best = 0;
  for (i, &score) in scores.iter().enumerate().skip(1) {
    if score > scores[best] {
      best = i;
    }
  }
  best
}

/// 由两个模型的原始输出得出判定结果。
///
/// 性别与头发长度均以严格大于 0.5 判为正类。年龄段为 20–30 时，
/// 头发长度完全取代性别模型的结论：长发判为女性，短发判为男性。
pub fn decide(gender: GenderPrediction, age: AgePrediction, hair: HairPrediction) -> Verdict {
  let mut gender_class = if gender.0 > BINARY_THRESHOLD {
    Gender::Male
  } else {
    Gender::Female
  };

  let age_class = AgeGroup::from_class_id(argmax(&age.0)).unwrap_or(AgeGroup::Under20);

  let hair_label = if hair.0 > BINARY_THRESHOLD {
    HairLength::Long
  } else {
    HairLength::Short
  };

  if age_class == AgeGroup::From20To30 {
    gender_class = match hair_label {
      HairLength::Long => Gender::Female,
      HairLength::Short => Gender::Male,
    };
  }

  Verdict {
    gender: gender_class,
    age: age_class,
    hair: hair_label,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(g: f32, a: [f32; 3], h: f32) -> Verdict {
    decide(GenderPrediction(g), AgePrediction(a), HairPrediction(h))
  }

  #[test]
  fn long_hair_overrides_male_in_middle_bucket() {
    let verdict = run(0.9, [0.1, 0.8, 0.1], 0.7);
    assert_eq!(verdict.age, AgeGroup::From20To30);
    assert_eq!(verdict.hair, HairLength::Long);
    assert_eq!(verdict.gender, Gender::Female);
  }

  #[test]
  fn short_hair_overrides_female_in_middle_bucket() {
    let verdict = run(0.05, [0.2, 0.6, 0.2], 0.1);
    assert_eq!(verdict.gender, Gender::Male);
    assert_eq!(verdict.hair, HairLength::Short);
  }

  #[test]
  fn other_buckets_keep_model_gender() {
    let verdict = run(0.9, [0.8, 0.1, 0.1], 0.7);
    assert_eq!(verdict.age, AgeGroup::Under20);
    assert_eq!(verdict.gender, Gender::Male);

    let verdict = run(0.2, [0.1, 0.1, 0.8], 0.1);
    assert_eq!(verdict.age, AgeGroup::Over30);
    assert_eq!(verdict.gender, Gender::Female);
  }

  #[test]
  fn thresholds_are_strict() {
    let verdict = run(0.5, [1.0, 0.0, 0.0], 0.5);
    assert_eq!(verdict.gender, Gender::Female);
    assert_eq!(verdict.hair, HairLength::Short);

    let verdict = run(0.500_001, [1.0, 0.0, 0.0], 0.500_001);
    assert_eq!(verdict.gender, Gender::Male);
    assert_eq!(verdict.hair, HairLength::Long);
  }

  #[test]
  fn argmax_prefers_lowest_index_on_ties() {
    assert_eq!(run(0.0, [0.33, 0.33, 0.34], 0.0).age, AgeGroup::Over30);
    assert_eq!(run(0.0, [0.5, 0.5, 0.0], 0.0).age, AgeGroup::Under20);
    assert_eq!(run(0.0, [0.0, 0.5, 0.5], 0.0).age, AgeGroup::From20To30);
    assert_eq!(argmax(&[1.0 / 3.0; 3]), 0);
  }

  #[test]
  fn first_nan_score_wins_argmax() {
    assert_eq!(argmax(&[f32::NAN, 0.2, 0.1]), 0);
    assert_eq!(argmax(&[0.1, f32::NAN, 0.9]), 1);
    assert_eq!(argmax(&[0.9, f32::NAN, f32::NAN]), 1);
    assert_eq!(run(0.0, [0.9, f32::NAN, 0.05], 0.7).age, AgeGroup::From20To30);
  }

  #[test]
  fn nan_probabilities_fall_to_negative_class() {
    let verdict = run(f32::NAN, [0.9, 0.05, 0.05], f32::NAN);
    assert_eq!(verdict.gender, Gender::Female);
    assert_eq!(verdict.hair, HairLength::Short);
  }

  #[test]
  fn rule_is_total_over_a_grid() {
    let steps = [0.0, 0.25, 0.5, 0.75, 1.0];
    for &g in &steps {
      for &h in &steps {
        for &a0 in &steps {
          for &a1 in steps.iter().filter(|&&a1| a0 + a1 <= 1.0) {
            let verdict = run(g, [a0, a1, 1.0 - a0 - a1], h);
            assert!(verdict.gender.class_id() <= 1);
            assert!(verdict.age.class_id() <= 2);
            if verdict.age == AgeGroup::From20To30 {
              let expected = match verdict.hair {
                HairLength::Long => Gender::Female,
                HairLength::Short => Gender::Male,
              };
              assert_eq!(verdict.gender, expected);
            }
          }
        }
      }
    }
  }

  #[test]
  fn labels_match_display_strings() {
    assert_eq!(Gender::Male.to_string(), "Male");
    assert_eq!(AgeGroup::From20To30.to_string(), "20–30");
    assert_eq!(AgeGroup::Over30.as_str(), ">30");
    assert_eq!(HairLength::Long.to_string(), "long");
  }
}
