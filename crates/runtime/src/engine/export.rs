//! Flat tabular export of every cached stat on a platform.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use stats_core::{CachedAccountStat, GameDefinition};

/// Separator used when the caller supplies an empty one.
pub const DEFAULT_SEPARATOR: &str = ",";

const ACCOUNT_HEADER: &str = "Account name:";

/// Cached stats of one game, as input to [`FlatTable::build`].
pub struct GameExport {
    pub game: Arc<GameDefinition>,
    pub stats: Vec<CachedAccountStat>,
}

/// Header plus one row per account, every cell already sanitized.
///
/// Every row has exactly as many cells as the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatTable {
    separator: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FlatTable {
    /// Builds the table for `games`, which are expected in platform order.
    ///
    /// Columns are `game:metric` pairs: defined metrics first in definition
    /// order, then undeclared collected keys in first-seen order. Columns no
    /// account has a value for are left out. Accounts are sorted by id.
    pub fn build(games: &[GameExport], separator: &str) -> Self {
        let separator = if separator.is_empty() {
            DEFAULT_SEPARATOR
        } else {
            separator
        };

        let columns: Vec<(usize, String)> = games
            .iter()
            .enumerate()
            .flat_map(|(index, export)| {
                metric_columns(export)
                    .into_iter()
                    .map(move |key| (index, key))
            })
            .collect();

        let by_account: Vec<HashMap<&str, &CachedAccountStat>> = games
            .iter()
            .map(|export| {
                export
                    .stats
                    .iter()
                    .map(|stat| (stat.account_id.as_str(), stat))
                    .collect()
            })
            .collect();

        let accounts: BTreeSet<&str> = by_account
            .iter()
            .flat_map(|stats| stats.keys().copied())
            .collect();

        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push(sanitize(ACCOUNT_HEADER, separator));
        header.extend(columns.iter().map(|(index, key)| {
            sanitize(&format!("{}:{}", games[*index].game.name, key), separator)
        }));

        let rows = accounts
            .into_iter()
            .map(|account_id| {
                let mut row = Vec::with_capacity(columns.len() + 1);
                row.push(sanitize(account_id, separator));
                row.extend(columns.iter().map(|(index, key)| {
                    by_account[*index]
                        .get(account_id)
                        .and_then(|stat| stat.collected.get(key))
                        .map(|value| sanitize(value, separator))
                        .unwrap_or_default()
                }));
                row
            })
            .collect();

        Self {
            separator: separator.to_string(),
            header,
            rows,
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Text lines: the `SEP=` declaration, the header, then one per account.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format!("SEP={}", self.separator));
        lines.push(self.header.join(&self.separator));
        lines.extend(self.rows.iter().map(|row| row.join(&self.separator)));
        lines
    }

    pub fn render(&self) -> String {
        let mut text = self.lines().join("\n");
        text.push('\n');
        text
    }
}

fn metric_columns(export: &GameExport) -> Vec<String> {
    let has_value = |key: &str| {
        export
            .stats
            .iter()
            .any(|stat| stat.collected.contains_key(key))
    };

    let mut columns: Vec<String> = export
        .game
        .metrics()
        .iter()
        .map(|metric| metric.key.as_str())
        .filter(|key| has_value(*key))
        .map(str::to_string)
        .collect();

    for stat in &export.stats {
        for key in stat.collected.keys() {
            if !export.game.has_metric(key) && !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

/// Replaces the separator and line breaks inside a cell.
///
/// The replacement is a space, or `_` when the separator itself contains a
/// space, so the separator never survives inside a cell.
pub fn sanitize(cell: &str, separator: &str) -> String {
    let filler = if separator.contains(' ') { "_" } else { " " };
    let cell = if separator.is_empty() {
        cell.to_string()
    } else {
        cell.replace(separator, filler)
    };
    cell.replace(['\r', '\n'], filler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stats_core::{CollectedStats, DataSource, MetricDefinition};

    fn game(name: &str, metrics: &[&str]) -> Arc<GameDefinition> {
        let mut game = GameDefinition::new(
            name,
            name.to_lowercase(),
            DataSource::Web {
                url: "https://x.invalid".into(),
            },
        );
        for key in metrics {
            game = game.with_metric(MetricDefinition::new(*key, format!("/{key}")));
        }
        Arc::new(game)
    }

    fn stat(account: &str, pairs: &[(&str, &str)]) -> CachedAccountStat {
        let mut stat = CachedAccountStat::new(account);
        stat.collected = pairs.iter().copied().collect::<CollectedStats>();
        stat
    }

    #[test]
    fn test_layout_and_missing_cells() {
        let games = vec![
            GameExport {
                game: game("CS:GO", &["Kills", "Deaths", "Unused"]),
                stats: vec![
                    stat("B", &[("Deaths", "2"), ("Kills", "1")]),
                    stat("A", &[("Kills", "10"), ("Extra", "x")]),
                ],
            },
            GameExport {
                game: game("TF2", &["Wins"]),
                stats: vec![stat("A", &[("Wins", "5")])],
            },
        ];

        let table = FlatTable::build(&games, ";");
        assert_eq!(
            table.lines(),
            vec![
                "SEP=;",
                "Account name:;CS:GO:Kills;CS:GO:Deaths;CS:GO:Extra;TF2:Wins",
                "A;10;;x;5",
                "B;1;2;;",
            ]
        );
    }

    #[test]
    fn test_separator_inside_values_is_replaced() {
        let games = vec![GameExport {
            game: game("CS:GO", &["Kills", "Rank"]),
            stats: vec![stat("A,1", &[("Kills", "1,000"), ("Rank", "Gold\nNova")])],
        }];

        let table = FlatTable::build(&games, ",");
        assert_eq!(table.rows()[0], vec!["A 1", "1 000", "Gold Nova"]);

        for line in table.lines().iter().skip(1) {
            assert_eq!(line.split(',').count(), table.header().len());
        }
    }

    #[test]
    fn test_colon_separator_keeps_header_aligned() {
        let games = vec![GameExport {
            game: game("CS:GO", &["Kills"]),
            stats: vec![stat("A1", &[("Kills", "10")])],
        }];

        let table = FlatTable::build(&games, ":");
        let lines = table.lines();
        assert_eq!(lines[1], "Account name :CS GO Kills");
        assert_eq!(lines[2], "A1:10");
        assert_eq!(lines[1].split(':').count(), lines[2].split(':').count());
    }

    #[test]
    fn test_space_separator_is_not_left_in_cells() {
        let games = vec![GameExport {
            game: game("Rocket League", &["Rank"]),
            stats: vec![stat("A 1", &[("Rank", "Grand Champion")])],
        }];

        let table = FlatTable::build(&games, " ");
        assert_eq!(
            table.lines()[1..],
            ["Account_name: Rocket_League:Rank", "A_1 Grand_Champion"]
        );
        assert_eq!(sanitize("a\nb", " "), "a_b");
        assert_eq!(sanitize("a\nb", ";"), "a b");
    }

    #[test]
    fn test_empty_separator_falls_back() {
        let table = FlatTable::build(&[], "");
        assert_eq!(table.separator(), DEFAULT_SEPARATOR);
        assert_eq!(table.render(), "SEP=,\nAccount name:\n");
    }
}
