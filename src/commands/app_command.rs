use crate::dataset::OrderStatus;
use chrono::NaiveDate;
use std::str::FromStr;

/// Filter edits typed on the dashboard command line. Handled by the UI
/// thread itself, never sent to the background task.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCommand {
    Clear,
    Category(String),
    Country(String),
    Status(OrderStatus),
    From(NaiveDate),
    To(NaiveDate),
    /// Drops one dimension: `category`, `country`, `status`, `from`, `to`.
    Reset(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Reload,
    Generate {
        rows: Option<usize>,
        seed: Option<u64>,
    },
    Validate,
    Filter(FilterCommand),
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "可用命令: reload | generate [rows] [seed] | validate | filter clear | filter category|country <name> | filter status <status> | filter from|to <YYYY-MM-DD> | filter reset <field> | help | quit";

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }

        match parts[0] {
            "reload" | "r" => Ok(AppCommand::Reload),
            "generate" | "gen" => {
                let rows = match parts.get(1) {
                    Some(tok) => match parse_rows(tok) {
                        Some(n) => Some(n),
                        None => {
                            return Ok(AppCommand::Unknown(format!("无效的行数: {}", tok)));
                        }
                    },
                    None => None,
                };
                let seed = match parts.get(2) {
                    Some(tok) => match tok.parse::<u64>() {
                        Ok(v) => Some(v),
                        Err(_) => {
                            return Ok(AppCommand::Unknown(format!("无效的 seed: {}", tok)));
                        }
                    },
                    None => None,
                };
                Ok(AppCommand::Generate { rows, seed })
            }
            "validate" => Ok(AppCommand::Validate),
            "filter" => Ok(parse_filter(&parts[1..])),
            "help" | "h" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" => Ok(AppCommand::Quit),
            _ => Ok(AppCommand::Unknown(format!("未知命令: {}", parts[0]))),
        }
    }
}

fn parse_filter(args: &[&str]) -> AppCommand {
    let usage = || {
        AppCommand::Unknown(
            "用法: filter clear | filter category|country <name> | filter status <status> | filter from|to <YYYY-MM-DD> | filter reset <field>"
                .to_string(),
        )
    };
    let field = match args.first() {
        Some(f) => f.to_ascii_lowercase(),
        None => return AppCommand::Filter(FilterCommand::Clear),
    };
    let value = args[1..].join(" ");

    let cmd = match field.as_str() {
        "clear" | "--clear" => FilterCommand::Clear,
        "category" | "cat" if !value.is_empty() => FilterCommand::Category(value),
        "country" if !value.is_empty() => FilterCommand::Country(value),
        "status" => match value.parse::<OrderStatus>() {
            Ok(st) => FilterCommand::Status(st),
            Err(e) => return AppCommand::Unknown(e),
        },
        "from" | "to" => match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
            Ok(d) if field == "from" => FilterCommand::From(d),
            Ok(d) => FilterCommand::To(d),
            Err(_) => return AppCommand::Unknown(format!("无效的日期: {}", value)),
        },
        "reset" => match value.as_str() {
            "category" | "country" | "status" | "from" | "to" => FilterCommand::Reset(value),
            _ => return usage(),
        },
        _ => return usage(),
    };
    AppCommand::Filter(cmd)
}

/// Accepts `5000`, `5_000` and `5k`.
fn parse_rows(s: &str) -> Option<usize> {
    let t = s.trim().to_ascii_lowercase().replace('_', "");
    if t.is_empty() {
        return None;
    }
    if let Ok(v) = t.parse::<usize>() {
        return Some(v);
    }
    t.strip_suffix('k')
        .and_then(|p| p.parse::<usize>().ok())
        .and_then(|v| v.checked_mul(1000))
}
