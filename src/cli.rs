//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::TraderulesError;
use crate::domain::record::TradingRecord;
use crate::domain::rule::Rule;
use crate::domain::rule_parser::parse_rule;
use crate::domain::series::{Series, SeriesTable};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::SeriesPort;

#[derive(Parser, Debug)]
#[command(name = "traderules", about = "Trading rule evaluation engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a rule at every index of a data file
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// Rule expression, overriding [rule] expr from the config
        #[arg(long)]
        rule: Option<String>,
        /// Data file, overriding [data] file from the config
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Parse and validate a rule without evaluating it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        rule: Option<String>,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Show the series available in a data file
    Info {
        #[arg(long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate { config, rule, data } => {
            run_evaluate(&config, rule.as_deref(), data.as_deref())
        }
        Command::Validate { config, rule, data } => {
            run_validate(&config, rule.as_deref(), data.as_deref())
        }
        Command::Info { data } => run_info(&data),
    }
}

fn load_config(path: &Path) -> Result<FileConfigAdapter, TraderulesError> {
    FileConfigAdapter::from_file(path).map_err(|e| TraderulesError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn resolve_expr(
    config: &FileConfigAdapter,
    rule_arg: Option<&str>,
) -> Result<String, TraderulesError> {
    match rule_arg {
        Some(expr) => Ok(expr.to_string()),
        None => config
            .get_string("rule", "expr")
            .ok_or(TraderulesError::ConfigMissing {
                section: "rule".into(),
                key: "expr".into(),
            }),
    }
}

fn resolve_data_path(
    config: &FileConfigAdapter,
    data_arg: Option<&Path>,
) -> Result<PathBuf, TraderulesError> {
    match data_arg {
        Some(path) => Ok(path.to_path_buf()),
        None => config
            .get_string("data", "file")
            .map(PathBuf::from)
            .ok_or(TraderulesError::ConfigMissing {
                section: "data".into(),
                key: "file".into(),
            }),
    }
}

fn build_rule(expr: &str, table: &SeriesTable) -> Result<Box<dyn Rule>, TraderulesError> {
    parse_rule(expr, &table.registry())
}

fn fail(err: TraderulesError, expr: Option<&str>) -> ExitCode {
    if let (TraderulesError::RuleParse(parse), Some(input)) = (&err, expr) {
        eprintln!("error:\n{}", parse.display_with_context(input));
    } else {
        eprintln!("error: {err}");
    }
    ExitCode::from(&err)
}

fn run_evaluate(config: &Path, rule_arg: Option<&str>, data_arg: Option<&Path>) -> ExitCode {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(e) => return fail(e, None),
    };
    let expr = match resolve_expr(&config, rule_arg) {
        Ok(e) => e,
        Err(e) => return fail(e, None),
    };
    let data_path = match resolve_data_path(&config, data_arg) {
        Ok(p) => p,
        Err(e) => return fail(e, None),
    };

    let table = match CsvAdapter::new(data_path).load_table() {
        Ok(t) => t,
        Err(e) => return fail(e, None),
    };
    let rule = match build_rule(&expr, &table) {
        Ok(r) => r,
        Err(e) => return fail(e, Some(&expr)),
    };

    let rows = table.rows();
    let start = config.get_int("evaluate", "start", 0).max(0) as usize;
    let end = match config.get_int("evaluate", "end", -1) {
        n if n < 0 => rows.saturating_sub(1),
        n => (n as usize).min(rows.saturating_sub(1)),
    };

    let record = TradingRecord::new();
    let mut satisfied_count = 0usize;
    let mut evaluated = 0usize;

    if rows > 0 && start <= end {
        for index in start..=end {
            let verdict = match rule.evaluate(index, &record) {
                Ok(v) => v,
                Err(e) => return fail(e, None),
            };
            evaluated += 1;
            if verdict.is_satisfied() {
                satisfied_count += 1;
                let label = match &table.dates {
                    Some(dates) => format!("{}  index {}", dates[index], index),
                    None => format!("index {}", index),
                };
                println!("{}  satisfied: {}", label, verdict.trace().join(", "));
            }
        }
    }

    println!(
        "{} of {} indices satisfied '{}'",
        satisfied_count,
        evaluated,
        rule.description()
    );
    ExitCode::SUCCESS
}

fn run_validate(config: &Path, rule_arg: Option<&str>, data_arg: Option<&Path>) -> ExitCode {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(e) => return fail(e, None),
    };
    let expr = match resolve_expr(&config, rule_arg) {
        Ok(e) => e,
        Err(e) => return fail(e, None),
    };
    let data_path = match resolve_data_path(&config, data_arg) {
        Ok(p) => p,
        Err(e) => return fail(e, None),
    };
    let table = match CsvAdapter::new(data_path).load_table() {
        Ok(t) => t,
        Err(e) => return fail(e, None),
    };

    match build_rule(&expr, &table) {
        Ok(rule) => {
            println!("rule ok: {}", rule.description());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e, Some(&expr)),
    }
}

fn run_info(data: &Path) -> ExitCode {
    let table = match CsvAdapter::new(data.to_path_buf()).load_table() {
        Ok(t) => t,
        Err(e) => return fail(e, None),
    };

    println!("{} rows", table.rows());
    if let Some(dates) = &table.dates {
        if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
            println!("dates {} to {}", first, last);
        }
    }
    for column in &table.columns {
        println!("series {} ({} values)", column.name(), column.len());
    }
    ExitCode::SUCCESS
}
