//! 画面规则 - 四条启发式规则及其分组

pub mod contour;
pub mod evaluators;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::video::Frame;

/// 单帧单规则判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Followed,
    Violated,
}

impl Verdict {
    pub fn from_followed(followed: bool) -> Self {
        if followed {
            Verdict::Followed
        } else {
            Verdict::Violated
        }
    }

    pub fn is_violated(self) -> bool {
        self == Verdict::Violated
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Followed => f.write_str("Followed"),
            Verdict::Violated => f.write_str("Violated"),
        }
    }
}

/// 规则分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GuidelineGroup {
    #[serde(rename = "Primary Guidelines")]
    Primary,
    #[serde(rename = "Environmental Guidelines")]
    Environmental,
}

impl GuidelineGroup {
    pub const ALL: [GuidelineGroup; 2] = [GuidelineGroup::Primary, GuidelineGroup::Environmental];

    pub fn label(self) -> &'static str {
        match self {
            GuidelineGroup::Primary => "Primary Guidelines",
            GuidelineGroup::Environmental => "Environmental Guidelines",
        }
    }

    pub fn rules(self) -> &'static [RuleId] {
        match self {
            GuidelineGroup::Primary => &[RuleId::Rule1, RuleId::Rule2],
            GuidelineGroup::Environmental => &[RuleId::Rule3, RuleId::Rule4],
        }
    }
}

impl fmt::Display for GuidelineGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGroup(pub String);

impl fmt::Display for UnknownGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown guideline group: {}", self.0)
    }
}

impl std::error::Error for UnknownGroup {}

impl FromStr for GuidelineGroup {
    type Err = UnknownGroup;

    /// 接受完整标签或简写，不区分大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary guidelines" | "primary" => Ok(GuidelineGroup::Primary),
            "environmental guidelines" | "environmental" => Ok(GuidelineGroup::Environmental),
            _ => Err(UnknownGroup(s.to_string())),
        }
    }
}

/// 规则编号，顺序即报告中的枚举顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleId {
    #[serde(rename = "Rule 1")]
    Rule1,
    #[serde(rename = "Rule 2")]
    Rule2,
    #[serde(rename = "Rule 3")]
    Rule3,
    #[serde(rename = "Rule 4")]
    Rule4,
}

impl RuleId {
    pub const ALL: [RuleId; 4] = [RuleId::Rule1, RuleId::Rule2, RuleId::Rule3, RuleId::Rule4];

    pub fn number(self) -> u8 {
        match self {
            RuleId::Rule1 => 1,
            RuleId::Rule2 => 2,
            RuleId::Rule3 => 3,
            RuleId::Rule4 => 4,
        }
    }

    pub fn group(self) -> GuidelineGroup {
        match self {
            RuleId::Rule1 | RuleId::Rule2 => GuidelineGroup::Primary,
            RuleId::Rule3 | RuleId::Rule4 => GuidelineGroup::Environmental,
        }
    }

    /// 面向操作员的规则描述
    pub fn guideline(self) -> &'static str {
        match self {
            RuleId::Rule1 => "The car should be black.",
            RuleId::Rule2 => "The car should create smoke.",
            RuleId::Rule3 => "The grass should be green.",
            RuleId::Rule4 => "The road should be gray in color.",
        }
    }

    pub fn evaluate(self, frame: &Frame) -> Verdict {
        match self {
            RuleId::Rule1 => evaluators::car_is_black(frame),
            RuleId::Rule2 => evaluators::smoke_present(frame),
            RuleId::Rule3 => evaluators::grass_is_green(frame),
            RuleId::Rule4 => evaluators::road_is_gray(frame),
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule {}", self.number())
    }
}

/// 本次分析需要评估的规则
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<RuleId>,
}

impl RuleSet {
    /// 分组 → 规则，多组取并集，按规则编号排序
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a GuidelineGroup>) -> Self {
        let mut rules: Vec<RuleId> = groups
            .into_iter()
            .flat_map(|g| g.rules().iter().copied())
            .collect();
        rules.sort();
        rules.dedup();
        Self { rules }
    }

    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, rule: RuleId) -> bool {
        self.rules.contains(&rule)
    }
}
