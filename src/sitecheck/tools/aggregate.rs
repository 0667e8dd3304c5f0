//! Hierarchical score rollups over the normalized row sequence.
//!
//! Both trees are instances of one reducer: a grouping path is a list of key
//! extractors, and each row adds its score to every node along its path. The
//! global tree groups by category, subcategory and sub-subcategory; the
//! per-assignee tree puts the assignee in front of the same three levels.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use tracing::debug;

use crate::sitecheck::tools::model::InspectionRow;

/// Extracts the key of one grouping level. `None` stops the descent, so the
/// row contributes to the levels above but creates no node at this one.
pub type KeyFn = fn(&InspectionRow) -> Option<&str>;

fn category_key(row: &InspectionRow) -> Option<&str> {
    Some(row.category.as_str())
}

fn subcategory_key(row: &InspectionRow) -> Option<&str> {
    Some(row.subcategory.as_str())
}

fn sub_subcategory_key(row: &InspectionRow) -> Option<&str> {
    Some(row.sub_subcategory.as_str()).filter(|key| !key.is_empty())
}

fn assignee_key(row: &InspectionRow) -> Option<&str> {
    Some(row.assignee.as_str())
}

/// Category → subcategory → sub-subcategory.
pub const CATEGORY_PATH: &[KeyFn] = &[category_key, subcategory_key, sub_subcategory_key];

/// Assignee → category → subcategory → sub-subcategory.
pub const ASSIGNEE_PATH: &[KeyFn] = &[
    assignee_key,
    category_key,
    subcategory_key,
    sub_subcategory_key,
];

/// Rounds a ratio to a percentage with one decimal; 0 when `max` is 0.
pub fn percentage(score: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (score as f64 / max as f64 * 1000.0).round() / 10.0
}

/// Qualitative band for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            ScoreBand::Excellent
        } else if percentage >= 80.0 {
            ScoreBand::Good
        } else if percentage >= 70.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

/// Flat totals of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub sum_score: u64,
    pub sum_max: u64,
    pub item_count: usize,
    pub percentage: f64,
    pub band: Option<ScoreBand>,
}

/// One node of a rollup tree.
///
/// Percentages are never stored; [`AggregationNode::percentage`] derives them
/// from the sums on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationNode {
    pub sum_score: u64,
    pub sum_max: u64,
    pub item_count: usize,
    /// Distinct non-blank assignees seen under a global category node. Empty
    /// at every other level.
    pub assignees: BTreeSet<String>,
    pub children: BTreeMap<String, AggregationNode>,
}

impl AggregationNode {
    pub fn percentage(&self) -> f64 {
        percentage(self.sum_score, self.sum_max)
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_percentage(self.percentage())
    }

    pub fn child(&self, key: &str) -> Option<&AggregationNode> {
        self.children.get(key)
    }

    /// Totals of this node, without children.
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            sum_score: self.sum_score,
            sum_max: self.sum_max,
            item_count: self.item_count,
            percentage: self.percentage(),
            band: (self.item_count > 0).then(|| self.band()),
        }
    }

    fn absorb(&mut self, row: &InspectionRow) {
        self.sum_score += u64::from(row.achieved_score);
        self.sum_max += u64::from(row.max_score);
        self.item_count += 1;
    }
}

impl Serialize for AggregationNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AggregationNode", 6)?;
        state.serialize_field("sumScore", &self.sum_score)?;
        state.serialize_field("sumMax", &self.sum_max)?;
        state.serialize_field("itemCount", &self.item_count)?;
        state.serialize_field("percentage", &self.percentage())?;
        if self.assignees.is_empty() {
            state.skip_field("assignees")?;
        } else {
            state.serialize_field("assignees", &self.assignees)?;
        }
        if self.children.is_empty() {
            state.skip_field("children")?;
        } else {
            state.serialize_field("children", &self.children)?;
        }
        state.end()
    }
}

/// Groups `rows` along `path`, accumulating sums and counts at every level.
pub fn reduce(rows: &[InspectionRow], path: &[KeyFn]) -> BTreeMap<String, AggregationNode> {
    let mut tree = BTreeMap::new();
    for row in rows {
        accumulate(&mut tree, row, path);
    }
    tree
}

/// Adds `row` along `path` and returns the top-level node it touched.
fn accumulate<'t>(
    level: &'t mut BTreeMap<String, AggregationNode>,
    row: &InspectionRow,
    path: &[KeyFn],
) -> Option<&'t mut AggregationNode> {
    let (key_fn, rest) = path.split_first()?;
    let key = key_fn(row)?;
    let node = level.entry(key.to_string()).or_default();
    node.absorb(row);
    accumulate(&mut node.children, row, rest);
    Some(node)
}

/// Which assignee's view of the rollup to read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssigneeFilter {
    #[default]
    All,
    Assignee(String),
}

impl From<Option<String>> for AssigneeFilter {
    fn from(value: Option<String>) -> Self {
        value.map_or(AssigneeFilter::All, AssigneeFilter::Assignee)
    }
}

/// Both rollup trees plus the grand total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rollup {
    pub total: AggregationNode,
    pub by_category: BTreeMap<String, AggregationNode>,
    pub by_assignee: BTreeMap<String, AggregationNode>,
}

static NO_CATEGORIES: BTreeMap<String, AggregationNode> = BTreeMap::new();

/// A filtered read of a [`Rollup`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection<'a> {
    pub summary: ScoreSummary,
    pub categories: &'a BTreeMap<String, AggregationNode>,
}

impl Rollup {
    /// Reads the rollup for all assignees or a single one. An assignee with
    /// no rows yields zero totals and no categories.
    pub fn select(&self, filter: &AssigneeFilter) -> Selection<'_> {
        match filter {
            AssigneeFilter::All => Selection {
                summary: self.total.summary(),
                categories: &self.by_category,
            },
            AssigneeFilter::Assignee(name) => match self.by_assignee.get(name) {
                Some(node) => Selection {
                    summary: node.summary(),
                    categories: &node.children,
                },
                None => Selection {
                    summary: ScoreSummary::default(),
                    categories: &NO_CATEGORIES,
                },
            },
        }
    }

    /// Distinct assignees in sorted order.
    pub fn assignees(&self) -> impl Iterator<Item = &str> {
        self.by_assignee.keys().map(String::as_str)
    }
}

/// Builds both rollup trees and the grand total in a single pass.
pub fn aggregate(rows: &[InspectionRow]) -> Rollup {
    let mut rollup = Rollup::default();
    for row in rows {
        rollup.total.absorb(row);
        if let Some(category) = accumulate(&mut rollup.by_category, row, CATEGORY_PATH) {
            if !row.assignee.is_empty() {
                category.assignees.insert(row.assignee.clone());
            }
        }
        accumulate(&mut rollup.by_assignee, row, ASSIGNEE_PATH);
    }
    debug!(
        rows = rows.len(),
        categories = rollup.by_category.len(),
        assignees = rollup.by_assignee.len(),
        "aggregated checklist"
    );
    rollup
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, sub: &str, detail: &str, assignee: &str, score: u32, max: u32) -> InspectionRow {
        InspectionRow {
            category: category.into(),
            subcategory: sub.into(),
            sub_subcategory: detail.into(),
            task: "task".into(),
            assignee: assignee.into(),
            achieved_score: score,
            max_score: max,
            score_range_text: format!("0/{max}"),
        }
    }

    #[test]
    fn two_row_scenario() {
        let rows = [
            row("A", "X", "", "M1", 1, 1),
            row("A", "Y", "", "M2", 3, 5),
        ];
        let rollup = aggregate(&rows);

        let a = &rollup.by_category["A"];
        assert_eq!((a.sum_score, a.sum_max, a.item_count), (4, 6, 2));
        assert_eq!(a.percentage(), 66.7);
        assert_eq!(a.assignees.len(), 2);

        let m1_x = &rollup.by_assignee["M1"].children["A"].children["X"];
        assert_eq!((m1_x.sum_score, m1_x.sum_max), (1, 1));
        assert_eq!(m1_x.percentage(), 100.0);

        assert_eq!(rollup.total.sum_score, 4);
        assert!(rollup.total.children.is_empty());
    }

    #[test]
    fn sub_subcategory_level_only_for_non_empty_values() {
        let rows = [
            row("A", "X", "", "M1", 1, 1),
            row("A", "X", "D1", "M1", 1, 2),
        ];
        let rollup = aggregate(&rows);
        let x = &rollup.by_category["A"].children["X"];
        assert_eq!(x.item_count, 2);
        assert_eq!(x.children.len(), 1);
        assert_eq!(x.children["D1"].sum_max, 2);
    }

    #[test]
    fn parents_equal_sum_of_children() {
        let rows = [
            row("A", "X", "", "M1", 1, 2),
            row("A", "Y", "", "M1", 2, 2),
            row("B", "Z", "", "M2", 0, 3),
        ];
        let rollup = aggregate(&rows);
        for node in rollup.by_category.values() {
            let children: u64 = node.children.values().map(|child| child.sum_score).sum();
            assert_eq!(node.sum_score, children);
        }
        let categories: u64 = rollup.by_category.values().map(|node| node.sum_max).sum();
        assert_eq!(rollup.total.sum_max, categories);
    }

    #[test]
    fn headcount_is_a_set() {
        let rows = [
            row("A", "X", "", "M1", 1, 1),
            row("A", "Y", "", "M1", 1, 1),
            row("A", "Z", "", "", 1, 1),
        ];
        let rollup = aggregate(&rows);
        assert_eq!(
            rollup.by_category["A"].assignees.iter().collect::<Vec<_>>(),
            ["M1"]
        );
        assert!(rollup.by_category["A"].children["X"].assignees.is_empty());
    }

    #[test]
    fn selection_by_assignee() {
        let rows = [
            row("A", "X", "", "M1", 1, 1),
            row("A", "Y", "", "M2", 3, 5),
        ];
        let rollup = aggregate(&rows);

        let all = rollup.select(&AssigneeFilter::All);
        assert_eq!(all.summary.sum_score, 4);
        assert_eq!(all.categories.len(), 1);

        let m2 = rollup.select(&AssigneeFilter::Assignee("M2".into()));
        assert_eq!(m2.summary.sum_score, 3);
        assert_eq!(m2.summary.percentage, 60.0);
        assert_eq!(m2.summary.band, Some(ScoreBand::Poor));

        let nobody = rollup.select(&AssigneeFilter::Assignee("M9".into()));
        assert_eq!(nobody.summary, ScoreSummary::default());
        assert!(nobody.categories.is_empty());

        assert_eq!(rollup.assignees().collect::<Vec<_>>(), ["M1", "M2"]);
    }

    #[test]
    fn empty_input_has_zero_percentage() {
        let rollup = aggregate(&[]);
        assert_eq!(rollup.total.percentage(), 0.0);
        assert_eq!(rollup.total.summary().band, None);
    }

    #[test]
    fn bands() {
        assert_eq!(ScoreBand::from_percentage(95.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_percentage(80.0), ScoreBand::Good);
        assert_eq!(ScoreBand::from_percentage(79.9), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_percentage(10.0), ScoreBand::Poor);
    }

    #[test]
    fn generic_reducer_accepts_custom_paths() {
        let rows = [
            row("A", "X", "", "M1", 1, 1),
            row("B", "X", "", "M1", 2, 2),
        ];
        let by_sub = reduce(&rows, &[subcategory_key]);
        assert_eq!(by_sub["X"].sum_score, 3);
        assert!(by_sub["X"].children.is_empty());
    }

    #[test]
    fn serialized_nodes_carry_derived_percentage() {
        let rollup = aggregate(&[row("A", "X", "", "M1", 1, 3)]);
        let json = serde_json::to_value(&rollup.by_category["A"]).unwrap();
        assert_eq!(json["percentage"], serde_json::json!(33.3));
        assert_eq!(json["assignees"], serde_json::json!(["M1"]));
        assert!(json["children"]["X"].get("children").is_none());
    }
}
