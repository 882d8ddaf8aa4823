//! Choosing among several recommended release groups.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::Mutex;

use tracing::warn;

use super::engine::RecommendedReleaseSet;

/// Decides which of several recommended groups to grab.
pub trait SelectionStrategy: Send + Sync {
    /// `set` always holds more than one group when called from a sync run.
    fn choose(&self, title: &str, set: RecommendedReleaseSet) -> RecommendedReleaseSet;
}

/// Keep every recommended group.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSelection;

impl SelectionStrategy for AutoSelection {
    fn choose(&self, _title: &str, set: RecommendedReleaseSet) -> RecommendedReleaseSet {
        set
    }
}

/// Ask on a terminal (or any reader/writer pair) which group to grab.
///
/// Accepts a 1-based group number or `a` for all groups, re-prompting on
/// anything else. End of input keeps every group.
pub struct InteractiveSelection<R, W> {
    io: Mutex<(R, W)>,
}

impl<R: BufRead, W: Write> InteractiveSelection<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }
}

impl InteractiveSelection<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

enum Choice {
    All,
    Group(usize),
}

fn parse_choice(input: &str, groups: usize) -> Option<Choice> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("a") {
        return Some(Choice::All);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=groups).contains(&n) => Some(Choice::Group(n - 1)),
        _ => None,
    }
}

fn write_menu<W: Write>(
    writer: &mut W,
    title: &str,
    set: &RecommendedReleaseSet,
) -> std::io::Result<()> {
    writeln!(writer, "Multiple recommended releases for {}:", title)?;
    for (i, group) in set.group_names().enumerate() {
        let trackers: Vec<&str> = set
            .group(group)
            .map(|ts| ts.map(|t| t.tracker.as_str()).collect())
            .unwrap_or_default();
        let name = if group.is_empty() { "(unknown group)" } else { group };
        writeln!(writer, "  [{}] {} ({})", i + 1, name, trackers.join(", "))?;
    }
    writer.flush()
}

impl<R, W> SelectionStrategy for InteractiveSelection<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn choose(&self, title: &str, set: RecommendedReleaseSet) -> RecommendedReleaseSet {
        let Ok(mut guard) = self.io.lock() else {
            warn!("Interactive selection unavailable, keeping all groups");
            return set;
        };
        let (reader, writer) = &mut *guard;

        if let Err(e) = write_menu(writer, title, &set) {
            warn!(error = %e, "Failed to write selection menu, keeping all groups");
            return set;
        }

        let names: Vec<String> = set.group_names().map(str::to_string).collect();
        loop {
            let _ = write!(writer, "Select a group [1-{}] or 'a' for all: ", names.len());
            let _ = writer.flush();

            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => return set,
                Ok(_) => {}
            }

            match parse_choice(&line, names.len()) {
                Some(Choice::All) => return set,
                Some(Choice::Group(i)) => return set.only_group(&names[i]),
                None => {
                    let _ = writeln!(writer, "Invalid choice: {}", line.trim());
                }
            }
        }
    }
}
