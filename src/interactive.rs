// ABOUTME: Interactive terminal prompts for database and table selection
// ABOUTME: Reads from an injected input stream so selection logic is testable

use crate::config::DatabaseProfile;
use crate::error::{ExportError, Result};
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// Tables shown per row in the listing
const TABLES_PER_ROW: usize = 3;

/// Parsed outcome of the table prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSelection {
    /// Literal `0`: every table, no confirmation needed
    All,
    /// A validated, de-duplicated subset in first-seen order
    Subset(Vec<String>),
}

/// Parse a table-prompt entry against the known tables
///
/// Accepts `0`, comma-separated 1-based indices, or comma-separated table
/// names. Returns `None` when the entry is invalid as a whole: a single
/// out-of-range index or unknown name rejects the entire entry.
///
/// # Examples
///
/// ```
/// # use table_ddl_exporter::interactive::{parse_table_selection, TableSelection};
/// let tables = vec!["users".to_string(), "orders".to_string()];
///
/// assert_eq!(parse_table_selection("0", &tables), Some(TableSelection::All));
/// assert_eq!(
///     parse_table_selection("2,1,2", &tables),
///     Some(TableSelection::Subset(vec!["orders".to_string(), "users".to_string()]))
/// );
/// assert_eq!(parse_table_selection("1,3", &tables), None);
/// ```
pub fn parse_table_selection(input: &str, tables: &[String]) -> Option<TableSelection> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input == "0" {
        return Some(TableSelection::All);
    }

    parse_table_numbers(input, tables)
        .or_else(|| parse_table_names(input, tables))
        .map(TableSelection::Subset)
}

fn split_entries(input: &str) -> impl Iterator<Item = &str> {
    input.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn parse_table_numbers(input: &str, tables: &[String]) -> Option<Vec<String>> {
    let mut selected = OrderedSelection::default();
    for part in split_entries(input) {
        let index: usize = part.parse().ok()?;
        if index < 1 || index > tables.len() {
            return None;
        }
        selected.insert(&tables[index - 1]);
    }
    selected.into_non_empty()
}

fn parse_table_names(input: &str, tables: &[String]) -> Option<Vec<String>> {
    let known: HashSet<&str> = tables.iter().map(String::as_str).collect();

    let mut selected = OrderedSelection::default();
    for name in split_entries(input) {
        if !known.contains(name) {
            return None;
        }
        selected.insert(name);
    }
    selected.into_non_empty()
}

/// Insertion-ordered set of table names
#[derive(Default)]
struct OrderedSelection {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl OrderedSelection {
    fn insert(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.ordered.push(name.to_string());
        }
    }

    fn into_non_empty(self) -> Option<Vec<String>> {
        if self.ordered.is_empty() {
            None
        } else {
            Some(self.ordered)
        }
    }
}

/// Prompt-driven selector over an input and an output stream
pub struct Selector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Selector<R, W> {
    /// Create a selector reading answers from `input` and printing to `output`
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// List the configured profiles and ask for one by number
    ///
    /// Re-prompts until a number in `1..=N` is entered.
    ///
    /// # Errors
    ///
    /// - [`ExportError::InputClosed`] if input ends before a valid choice
    /// - [`ExportError::Input`] or [`ExportError::Io`] if reading or printing fails
    pub fn select_database<'a>(
        &mut self,
        profiles: &'a [DatabaseProfile],
    ) -> Result<&'a DatabaseProfile> {
        self.say("\n=== Available database profiles ===")?;
        for (i, profile) in profiles.iter().enumerate() {
            self.say(&format!(
                "[{}] {} ({}://{}:{}/{})",
                i + 1,
                profile.name,
                profile.db_type,
                profile.host,
                profile.resolved_port(),
                profile.database
            ))?;
        }

        loop {
            self.prompt("\nSelect a database profile (enter its number): ")?;
            let input = self.read_line()?;

            match input.trim().parse::<usize>() {
                Ok(choice) if (1..=profiles.len()).contains(&choice) => {
                    tracing::debug!("Selected profile '{}'", profiles[choice - 1].name);
                    return Ok(&profiles[choice - 1]);
                }
                _ => self.say(&format!(
                    "Invalid choice, enter a number between 1 and {}",
                    profiles.len()
                ))?,
            }
        }
    }

    /// List the tables and ask which to export
    ///
    /// `0` selects everything without confirmation. Any other valid entry is
    /// echoed back and must be confirmed with `y`/`yes`.
    ///
    /// # Returns
    ///
    /// The tables to export: all of them for `0`, otherwise the selected
    /// subset in the order it was entered, without duplicates.
    ///
    /// # Errors
    ///
    /// - [`ExportError::UserCancelled`] if the confirmation is anything but `y`/`yes`
    /// - [`ExportError::InputClosed`] if input ends before a valid entry
    /// - [`ExportError::Input`] or [`ExportError::Io`] if reading or printing fails
    pub fn select_tables(&mut self, tables: &[String]) -> Result<Vec<String>> {
        self.say(&format!("\n=== Tables in database ({} total) ===", tables.len()))?;
        self.print_table_grid(tables)?;

        self.say("\n=== Choose tables to export ===")?;
        self.say("Options:")?;
        self.say("  0           - export all tables")?;
        self.say("  numbers     - export tables by number, comma-separated (e.g. 1,3,5)")?;
        self.say("  table names - export tables by name, comma-separated")?;

        loop {
            self.prompt("\nEnter selection: ")?;
            let input = self.read_line()?;

            if input.trim().is_empty() {
                self.say("Input cannot be empty, please try again")?;
                continue;
            }

            match parse_table_selection(&input, tables) {
                Some(TableSelection::All) => {
                    self.say(&format!("Selected all {} tables", tables.len()))?;
                    return Ok(tables.to_vec());
                }
                Some(TableSelection::Subset(selected)) => {
                    self.say(&format!(
                        "Selected {} table(s): {}",
                        selected.len(),
                        selected.join(", ")
                    ))?;
                    return self.confirm_export(selected);
                }
                None => {
                    self.say("Invalid input, please try again")?;
                    self.say("Hint: enter 0 for all tables, or table numbers/names separated by commas")?;
                }
            }
        }
    }

    fn confirm_export(&mut self, tables: Vec<String>) -> Result<Vec<String>> {
        self.prompt("\nConfirm export? (y/n): ")?;
        let answer = self.read_line()?.trim().to_lowercase();

        if answer == "y" || answer == "yes" {
            Ok(tables)
        } else {
            tracing::warn!("⚠ User cancelled export");
            Err(ExportError::UserCancelled)
        }
    }

    fn print_table_grid(&mut self, tables: &[String]) -> Result<()> {
        let mut grid = String::new();
        for (i, table) in tables.iter().enumerate() {
            if i > 0 && i % TABLES_PER_ROW == 0 {
                grid.push('\n');
            }
            grid.push_str(&format!("[{}] {:<20}", i + 1, table));
        }
        self.say(grid.trim_end())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(ExportError::Input)?;
        if read == 0 {
            return Err(ExportError::InputClosed);
        }
        Ok(line)
    }

    /// Print one line to the output stream
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the output stream cannot be written.
    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text).map_err(|e| ExportError::io("failed to write to terminal", e))
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{}", text)
            .and_then(|_| self.output.flush())
            .map_err(|e| ExportError::io("failed to write to terminal", e))
    }

    /// Recover the output stream, e.g. to inspect what was printed
    pub fn into_output(self) -> W {
        self.output
    }
}
