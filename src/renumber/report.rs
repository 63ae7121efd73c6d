//! Before/after listing of a rename plan for previews and logs.

use std::fmt;

use colored::Colorize;

use crate::renumber::types::RenamePlan;

/// One changed name of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Position in the planned entry list.
    pub index: usize,
    pub original: String,
    pub new: String,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} -> {}", self.index, self.original, self.new)
    }
}

/// List every pair of the plan that changes a name, in plan order.
#[must_use]
pub fn report(plan: &RenamePlan) -> Vec<ReportLine> {
    plan.renames()
        .map(|(index, pair)| ReportLine {
            index,
            original: pair.original_name.clone(),
            new: pair.new_name.clone(),
        })
        .collect()
}

/// Render the report as numbered, diff-coloured blocks:
/// a heading line followed by the old and new name with the changed characters coloured.
#[must_use]
pub fn render(lines: &[ReportLine], heading: &str) -> Vec<String> {
    let total = lines.len();
    let digits = total.checked_ilog10().map_or(1, |d| d as usize + 1);
    let mut output = Vec::with_capacity(total * 3);
    for (number, line) in lines.iter().enumerate() {
        output.push(format!("{heading} {:>digits$} / {total}:", number + 1).bold().to_string());
        let (old_diff, new_diff) = crate::color_diff(&line.original, &line.new);
        output.push(old_diff);
        output.push(new_diff);
    }
    output
}
