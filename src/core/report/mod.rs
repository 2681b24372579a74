//! 违规报告 - 按秒列出多数表决为违规的规则

pub mod aggregator;

pub use aggregator::{majority, time_bucket, TemporalAggregator, TimeBucket};

use crate::core::rules::{RuleId, RuleSet, Verdict};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TIME_HEADER: &str = "Time (mm:ss)";
pub const RULES_HEADER: &str = "Violated Rules";
pub const VIOLATIONS_TITLE: &str = "Video is not validated since violations are found:";
pub const CLEAN_MESSAGE: &str = "No violations found, video is validated.";

/// 报告遍历哪些时间桶
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketEnumeration {
    /// 所有生效规则记录过的桶
    #[default]
    ActiveRules,
    /// 只用 Rule 1 记录过的桶；未选主要规则时报告恒为空
    PrimaryRuleOnly,
}

/// mm:ss，两位补零
pub fn format_time(bucket: TimeBucket) -> String {
    format!("{:02}:{:02}", bucket / 60, bucket % 60)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub bucket: TimeBucket,
    pub time: String,
    pub violated_rules: Vec<RuleId>,
}

impl ReportRow {
    /// "Rule 1, Rule 3"
    pub fn rules_label(&self) -> String {
        self.violated_rules
            .iter()
            .map(RuleId::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub rows: Vec<ReportRow>,
    pub rules_checked: Vec<RuleId>,
    pub frames_analyzed: u64,
    pub fps: f64,
    pub bucket_enumeration: BucketEnumeration,
}

impl ViolationReport {
    /// 对每个桶计算生效规则的多数判定，保留至少一条违规的桶
    pub fn build(
        aggregator: &TemporalAggregator,
        rules: &RuleSet,
        mode: BucketEnumeration,
        frames_analyzed: u64,
        fps: f64,
    ) -> Self {
        let buckets = match mode {
            BucketEnumeration::ActiveRules => aggregator.buckets(),
            BucketEnumeration::PrimaryRuleOnly => aggregator.buckets_for(RuleId::Rule1),
        };

        let rows = buckets
            .iter()
            .filter_map(|&bucket| {
                let violated_rules: Vec<RuleId> = rules
                    .rules()
                    .iter()
                    .copied()
                    .filter(|&rule| aggregator.aggregate(rule, bucket) == Some(Verdict::Violated))
                    .collect();

                if violated_rules.is_empty() {
                    return None;
                }
                let row = ReportRow {
                    bucket,
                    time: format_time(bucket),
                    violated_rules,
                };
                debug!("⛔ {} -> {}", row.time, row.rules_label());
                Some(row)
            })
            .collect();

        Self {
            rows,
            rules_checked: rules.rules().to_vec(),
            frames_analyzed,
            fps,
            bucket_enumeration: mode,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.rows.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "{}", CLEAN_MESSAGE);
        }

        let labels: Vec<String> = self.rows.iter().map(ReportRow::rules_label).collect();
        let time_w = self
            .rows
            .iter()
            .map(|r| r.time.len())
            .chain([TIME_HEADER.len()])
            .max()
            .unwrap_or(0);
        let rules_w = labels
            .iter()
            .map(String::len)
            .chain([RULES_HEADER.len()])
            .max()
            .unwrap_or(0);

        writeln!(f, "{}", VIOLATIONS_TITLE)?;
        writeln!(f, "{:<time_w$}  {:<rules_w$}", TIME_HEADER, RULES_HEADER)?;
        writeln!(f, "{}  {}", "-".repeat(time_w), "-".repeat(rules_w))?;
        for (row, label) in self.rows.iter().zip(&labels) {
            writeln!(f, "{:<time_w$}  {}", row.time, label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::GuidelineGroup;
    use Verdict::{Followed, Violated};

    fn all_rules() -> RuleSet {
        RuleSet::from_groups(&GuidelineGroup::ALL)
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(6000), "100:00");
    }

    #[test]
    fn test_all_followed_is_clean() {
        let mut agg = TemporalAggregator::new();
        for bucket in 0..3 {
            for rule in RuleId::ALL {
                agg.record(rule, bucket, Followed);
            }
        }
        let report = ViolationReport::build(&agg, &all_rules(), BucketEnumeration::ActiveRules, 3, 1.0);
        assert!(report.is_clean());
        assert_eq!(report.to_string().trim(), CLEAN_MESSAGE);
    }

    #[test]
    fn test_rows_list_violated_rules_in_order() {
        let mut agg = TemporalAggregator::new();
        agg.record(RuleId::Rule1, 0, Violated);
        agg.record(RuleId::Rule2, 0, Followed);
        agg.record(RuleId::Rule3, 0, Violated);
        agg.record(RuleId::Rule4, 0, Followed);
        agg.record(RuleId::Rule1, 1, Followed);
        agg.record(RuleId::Rule2, 1, Followed);
        agg.record(RuleId::Rule3, 1, Followed);
        agg.record(RuleId::Rule4, 1, Violated);

        let report = ViolationReport::build(&agg, &all_rules(), BucketEnumeration::ActiveRules, 2, 1.0);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].time, "00:00");
        assert_eq!(report.rows[0].rules_label(), "Rule 1, Rule 3");
        assert_eq!(report.rows[1].time, "00:01");
        assert_eq!(report.rows[1].rules_label(), "Rule 4");
    }

    #[test]
    fn test_rows_follow_first_seen_order() {
        let mut agg = TemporalAggregator::new();
        agg.record(RuleId::Rule1, 7, Violated);
        agg.record(RuleId::Rule1, 3, Violated);
        let rules = RuleSet::from_groups(&[GuidelineGroup::Primary]);
        let report = ViolationReport::build(&agg, &rules, BucketEnumeration::ActiveRules, 2, 1.0);
        let buckets: Vec<TimeBucket> = report.rows.iter().map(|r| r.bucket).collect();
        assert_eq!(buckets, vec![7, 3]);
    }

    #[test]
    fn test_inactive_rules_are_ignored() {
        let mut agg = TemporalAggregator::new();
        agg.record(RuleId::Rule3, 0, Violated);
        let rules = RuleSet::from_groups(&[GuidelineGroup::Primary]);
        let report = ViolationReport::build(&agg, &rules, BucketEnumeration::ActiveRules, 1, 1.0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_environmental_only_active_rules_reports_violations() {
        let mut agg = TemporalAggregator::new();
        agg.record(RuleId::Rule3, 0, Violated);
        agg.record(RuleId::Rule4, 0, Violated);
        let rules = RuleSet::from_groups(&[GuidelineGroup::Environmental]);

        let report = ViolationReport::build(&agg, &rules, BucketEnumeration::ActiveRules, 1, 1.0);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].rules_label(), "Rule 3, Rule 4");
    }

    #[test]
    fn test_environmental_only_primary_rule_enumeration_is_always_empty() {
        // 只按 Rule 1 的桶遍历时，未选主要规则则不会产出任何行
        let mut agg = TemporalAggregator::new();
        agg.record(RuleId::Rule3, 0, Violated);
        agg.record(RuleId::Rule4, 0, Violated);
        let rules = RuleSet::from_groups(&[GuidelineGroup::Environmental]);

        let report = ViolationReport::build(&agg, &rules, BucketEnumeration::PrimaryRuleOnly, 1, 1.0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_table_rendering() {
        let mut agg = TemporalAggregator::new();
        agg.record(RuleId::Rule2, 125, Violated);
        let rules = RuleSet::from_groups(&[GuidelineGroup::Primary]);
        let report = ViolationReport::build(&agg, &rules, BucketEnumeration::ActiveRules, 1, 1.0);
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], VIOLATIONS_TITLE);
        assert!(lines[1].starts_with(TIME_HEADER));
        assert!(lines[1].contains(RULES_HEADER));
        assert_eq!(lines[3], "02:05         Rule 2");
    }

    #[test]
    fn test_json_shape() {
        let mut agg = TemporalAggregator::new();
        agg.record(RuleId::Rule1, 1, Violated);
        let rules = RuleSet::from_groups(&[GuidelineGroup::Primary]);
        let report = ViolationReport::build(&agg, &rules, BucketEnumeration::ActiveRules, 1, 1.0);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["rows"][0]["time"], "00:01");
        assert_eq!(value["rows"][0]["violated_rules"][0], "Rule 1");
        assert_eq!(value["bucket_enumeration"], "active_rules");
    }
}
