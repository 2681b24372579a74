use crate::core::rules::{RuleId, Verdict};
use std::collections::{BTreeMap, HashMap, HashSet};

/// 整秒时间桶
pub type TimeBucket = u64;

/// floor(frame_index / fps)
pub fn time_bucket(frame_index: u64, fps: f64) -> TimeBucket {
    (frame_index as f64 / fps).floor() as TimeBucket
}

/// 多数表决；票数相同时取序列中先出现的判定
pub fn majority(verdicts: &[Verdict]) -> Option<Verdict> {
    let first = *verdicts.first()?;
    let violated = verdicts.iter().filter(|v| v.is_violated()).count();
    let followed = verdicts.len() - violated;

    Some(match violated.cmp(&followed) {
        std::cmp::Ordering::Greater => Verdict::Violated,
        std::cmp::Ordering::Less => Verdict::Followed,
        std::cmp::Ordering::Equal => first,
    })
}

/// 单条规则的时间线：桶按首次出现顺序保存
#[derive(Debug, Default, Clone)]
struct RuleTimeline {
    order: Vec<TimeBucket>,
    votes: HashMap<TimeBucket, Vec<Verdict>>,
}

impl RuleTimeline {
    fn record(&mut self, bucket: TimeBucket, verdict: Verdict) {
        self.votes
            .entry(bucket)
            .or_insert_with(|| {
                self.order.push(bucket);
                Vec::new()
            })
            .push(verdict);
    }
}

/// 逐帧判定的按秒聚合
#[derive(Debug, Default, Clone)]
pub struct TemporalAggregator {
    timelines: BTreeMap<RuleId, RuleTimeline>,
    /// 所有规则合并后的首次出现顺序
    order: Vec<TimeBucket>,
    seen: HashSet<TimeBucket>,
    records: u64,
}

impl TemporalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rule: RuleId, bucket: TimeBucket, verdict: Verdict) {
        self.timelines.entry(rule).or_default().record(bucket, verdict);
        if self.seen.insert(bucket) {
            self.order.push(bucket);
        }
        self.records += 1;
    }

    pub fn aggregate(&self, rule: RuleId, bucket: TimeBucket) -> Option<Verdict> {
        majority(self.verdicts(rule, bucket)?)
    }

    pub fn verdicts(&self, rule: RuleId, bucket: TimeBucket) -> Option<&[Verdict]> {
        self.timelines
            .get(&rule)?
            .votes
            .get(&bucket)
            .map(Vec::as_slice)
    }

    /// 某条规则记录过的桶（首次出现顺序），未记录返回空
    pub fn buckets_for(&self, rule: RuleId) -> &[TimeBucket] {
        self.timelines
            .get(&rule)
            .map(|t| t.order.as_slice())
            .unwrap_or(&[])
    }

    /// 所有规则记录过的桶的并集（首次出现顺序）
    pub fn buckets(&self) -> &[TimeBucket] {
        &self.order
    }

    pub fn record_count(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}
