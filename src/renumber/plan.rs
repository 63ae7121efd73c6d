//! Group-aware prefix planning.

use std::str::FromStr;

use crate::renumber::error::RenumberError;
use crate::renumber::parse::{format_prefixed, max_prefix_for_width};
use crate::renumber::sink::LogSink;
use crate::renumber::types::{Entry, Mode, PairStatus, RenamePair, RenamePlan, Unchanged};

/// How the caller picked the first entry of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartSelector {
    Index(usize),
    Name(String),
}

impl StartSelector {
    /// Resolve the selector to an index into `entries`.
    ///
    /// # Errors
    /// Returns an error if the index is out of range or no entry has the given name.
    pub fn resolve(&self, entries: &[Entry]) -> Result<usize, RenumberError> {
        match self {
            Self::Index(index) => {
                if *index < entries.len() {
                    Ok(*index)
                } else {
                    Err(RenumberError::StartOutOfRange {
                        index: *index,
                        len: entries.len(),
                    })
                }
            }
            Self::Name(name) => entries
                .iter()
                .position(|entry| entry.original_name == *name)
                .ok_or_else(|| RenumberError::UnknownStart(name.clone())),
        }
    }
}

impl FromStr for StartSelector {
    type Err = std::convert::Infallible;

    /// Plain numbers select by index, anything else by name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(value
            .trim()
            .parse::<usize>()
            .map_or_else(|_| Self::Name(value.to_string()), Self::Index))
    }
}

/// Compute the new name for every entry from `start_index` onwards.
///
/// The first target prefix is `start_prefix + 1` when incrementing and `start_prefix - 1` when decrementing,
/// clamped to the range of the prefix width. Every later group transition advances the prefix by one,
/// also in decrement mode. Entries before the start, directories and unrecognized names map to themselves.
///
/// # Errors
/// Returns an error if there are no entries, the index is out of range,
/// or the start entry has no recognizable prefix or group.
pub fn plan(
    entries: &[Entry],
    start_index: usize,
    start_prefix: u32,
    mode: Mode,
    sink: &dyn LogSink,
) -> Result<RenamePlan, RenumberError> {
    if entries.is_empty() {
        return Err(RenumberError::NoEntries);
    }
    let start = entries.get(start_index).ok_or(RenumberError::StartOutOfRange {
        index: start_index,
        len: entries.len(),
    })?;
    validate_start(start, start_index)?;

    let width = start.prefix_width;
    let max_prefix = max_prefix_for_width(width);
    let mut current_prefix = match mode {
        Mode::Increment => start_prefix.saturating_add(1),
        Mode::Decrement => start_prefix.saturating_sub(1),
    }
    .min(max_prefix);

    sink.emit(&format!(
        "Start prefix {start_prefix:0width$} {mode}ed to {current_prefix:0width$}"
    ));

    let mut pairs: Vec<RenamePair> = entries[..start_index]
        .iter()
        .map(|entry| RenamePair::identity(&entry.original_name, Unchanged::BeforeStart))
        .collect();

    let mut last_group: Option<&str> = None;
    for entry in &entries[start_index..] {
        if entry.is_directory {
            pairs.push(RenamePair::identity(&entry.original_name, Unchanged::Directory));
            continue;
        }
        let (Some(group), Some(_)) = (entry.group_label.as_deref(), entry.numeric_prefix) else {
            sink.warn(&format!("Skipping {} (group unrecognized)", entry.original_name));
            pairs.push(RenamePair::identity(&entry.original_name, Unchanged::Unrecognized));
            continue;
        };

        if last_group.is_some_and(|last| last != group) {
            current_prefix = current_prefix.saturating_add(1).min(max_prefix);
            sink.emit(&format!(
                "New group '{group}', prefix advanced to {current_prefix:0width$}"
            ));
        }
        last_group = Some(group);

        let new_name = format_prefixed(current_prefix, entry.prefix_width, &entry.remainder);
        if new_name == entry.original_name {
            pairs.push(RenamePair::identity(&entry.original_name, Unchanged::SameName));
        } else {
            pairs.push(RenamePair {
                original_name: entry.original_name.clone(),
                new_name,
                status: PairStatus::Rename,
            });
        }
    }

    Ok(RenamePlan { pairs })
}

fn validate_start(start: &Entry, index: usize) -> Result<(), RenumberError> {
    let reason = if start.numeric_prefix.is_none() {
        "no numeric prefix"
    } else if start.group_label.is_none() {
        "group unrecognized"
    } else {
        return Ok(());
    };
    Err(RenumberError::InvalidStart {
        index,
        name: start.original_name.clone(),
        reason,
    })
}

#[cfg(test)]
mod plan_tests {
    use super::*;
    use crate::renumber::parse::PrefixParser;
    use crate::renumber::sink::MemorySink;

    fn entries(names: &[&str]) -> Vec<Entry> {
        let parser = PrefixParser::default();
        names.iter().map(|name| Entry::new(name, &parser)).collect()
    }

    fn new_names(plan: &RenamePlan) -> Vec<&str> {
        plan.pairs.iter().map(|pair| pair.new_name.as_str()).collect()
    }

    #[test]
    fn single_group_gets_one_prefix() {
        let entries = entries(&["05a1.txt", "05a2.txt", "07a3.txt", "09a4.txt"]);
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 5, Mode::Increment, &sink).unwrap();
        assert_eq!(new_names(&plan), vec!["06a1.txt", "06a2.txt", "06a3.txt", "06a4.txt"]);
    }

    #[test]
    fn decrement_only_affects_first_prefix() {
        let entries = entries(&["05A.txt", "05A.md", "06B.txt", "06B.md", "07C.txt"]);
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 5, Mode::Decrement, &sink).unwrap();
        assert_eq!(
            new_names(&plan),
            vec!["04A.txt", "04A.md", "05B.txt", "05B.md", "06C.txt"]
        );
    }

    #[test]
    fn cats_and_dogs_scenario() {
        let entries = entries(&["01cats.jpg", "01cats.png", "02dogs.jpg"]);
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 1, Mode::Increment, &sink).unwrap();
        assert_eq!(new_names(&plan), vec!["02cats.jpg", "02cats.png", "03dogs.jpg"]);
        assert!(sink.contains("New group 'dogs', prefix advanced to 03"));
    }

    #[test]
    fn entries_before_start_are_identity() {
        let entries = entries(&["01a.txt", "02b.txt", "03c.txt"]);
        let sink = MemorySink::new();
        let plan = plan(&entries, 1, 2, Mode::Increment, &sink).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.pairs[0].status, PairStatus::Unchanged(Unchanged::BeforeStart));
        assert_eq!(new_names(&plan), vec!["01a.txt", "03b.txt", "04c.txt"]);
    }

    #[test]
    fn directories_and_unrecognized_do_not_change_group() {
        let parser = PrefixParser::default();
        let entries = vec![
            Entry::new("01a.txt", &parser),
            Entry::directory("01b", &parser),
            Entry::new("notes.txt", &parser),
            Entry::new("01 42.txt", &parser),
            Entry::new("01a.md", &parser),
        ];
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 1, Mode::Increment, &sink).unwrap();
        assert_eq!(
            new_names(&plan),
            vec!["02a.txt", "01b", "notes.txt", "01 42.txt", "02a.md"]
        );
        assert_eq!(plan.pairs[1].status, PairStatus::Unchanged(Unchanged::Directory));
        assert_eq!(plan.pairs[2].status, PairStatus::Unchanged(Unchanged::Unrecognized));
        assert!(sink.contains("Skipping notes.txt (group unrecognized)"));
        assert!(sink.contains("Skipping 01 42.txt (group unrecognized)"));
    }

    #[test]
    fn unchanged_name_is_identity() {
        let entries = entries(&["02a.txt", "03b.txt"]);
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 1, Mode::Increment, &sink).unwrap();
        assert!(plan.pairs.iter().all(RenamePair::is_identity));
        assert_eq!(plan.rename_count(), 0);
        assert_eq!(plan.pairs[0].status, PairStatus::Unchanged(Unchanged::SameName));
    }

    #[test]
    fn prefix_is_clamped_at_upper_bound() {
        let entries = entries(&["98a.txt", "98b.txt", "98c.txt"]);
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 98, Mode::Increment, &sink).unwrap();
        assert_eq!(new_names(&plan), vec!["99a.txt", "99b.txt", "99c.txt"]);
    }

    #[test]
    fn decrement_is_clamped_at_zero() {
        let entries = entries(&["00a.txt", "00b.txt"]);
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 0, Mode::Decrement, &sink).unwrap();
        assert_eq!(new_names(&plan), vec!["00a.txt", "01b.txt"]);
    }

    #[test]
    fn wider_prefix_scales_bounds() {
        let parser = PrefixParser::new(3).unwrap();
        let entries: Vec<Entry> = ["099a.txt", "099b.txt"]
            .iter()
            .map(|name| Entry::new(name, &parser))
            .collect();
        let sink = MemorySink::new();
        let plan = plan(&entries, 0, 99, Mode::Increment, &sink).unwrap();
        assert_eq!(new_names(&plan), vec!["100a.txt", "101b.txt"]);
    }

    #[test]
    fn invalid_start_without_prefix() {
        let entries = entries(&["cats.jpg", "01dogs.jpg"]);
        let sink = MemorySink::new();
        let result = plan(&entries, 0, 1, Mode::Increment, &sink);
        assert!(matches!(
            result,
            Err(RenumberError::InvalidStart {
                index: 0,
                reason: "no numeric prefix",
                ..
            })
        ));
    }

    #[test]
    fn invalid_start_without_group() {
        let entries = entries(&["0123.jpg"]);
        let sink = MemorySink::new();
        let result = plan(&entries, 0, 1, Mode::Increment, &sink);
        assert!(matches!(
            result,
            Err(RenumberError::InvalidStart {
                reason: "group unrecognized",
                ..
            })
        ));
    }

    #[test]
    fn start_out_of_range_and_empty_input() {
        let sink = MemorySink::new();
        assert!(matches!(
            plan(&entries(&["01a"]), 3, 1, Mode::Increment, &sink),
            Err(RenumberError::StartOutOfRange { index: 3, len: 1 })
        ));
        assert!(matches!(
            plan(&[], 0, 1, Mode::Increment, &sink),
            Err(RenumberError::NoEntries)
        ));
    }

    #[test]
    fn start_selector_parses_index_or_name() {
        assert_eq!("3".parse::<StartSelector>().unwrap(), StartSelector::Index(3));
        assert_eq!(
            "01cats.jpg".parse::<StartSelector>().unwrap(),
            StartSelector::Name("01cats.jpg".to_string())
        );
    }

    #[test]
    fn start_selector_resolves() {
        let entries = entries(&["01a.txt", "02b.txt"]);
        assert_eq!(StartSelector::Name("02b.txt".to_string()).resolve(&entries).unwrap(), 1);
        assert_eq!(StartSelector::Index(0).resolve(&entries).unwrap(), 0);
        assert!(StartSelector::Index(2).resolve(&entries).is_err());
        assert!(matches!(
            StartSelector::Name("missing".to_string()).resolve(&entries),
            Err(RenumberError::UnknownStart(_))
        ));
    }
}
