//! Line-oriented operation scripts for driving an allocator
//!
//! ```text
//! # comments and blank lines are ignored
//! alloc 1 2          # allocate a pair for fg=1, bg=2
//! find 1 2
//! reserve 5 9 10     # set pair 5 to fg=9, bg=10
//! release 5
//! dump
//! stats
//! teardown
//! ```

use crate::error::{Error, Result};
use crate::pairs::{ColorId, PairAllocator, PairId, PairObserver, PairStats};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// One scripted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Alloc { fg: ColorId, bg: ColorId },
    Find { fg: ColorId, bg: ColorId },
    Reserve { pair: PairId, fg: ColorId, bg: ColorId },
    Release { pair: PairId },
    Teardown,
    Dump,
    Stats,
}

impl FromStr for Op {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = match words.split_first() {
            Some((name, args)) => (*name, args),
            None => return Err("empty operation".to_string()),
        };

        let expect = |count: usize| {
            if args.len() == count {
                Ok(())
            } else {
                Err(format!("'{}' takes {} argument(s), got {}", name, count, args.len()))
            }
        };

        match name {
            "alloc" => {
                expect(2)?;
                Ok(Op::Alloc {
                    fg: color(args[0])?,
                    bg: color(args[1])?,
                })
            }
            "find" => {
                expect(2)?;
                Ok(Op::Find {
                    fg: color(args[0])?,
                    bg: color(args[1])?,
                })
            }
            "reserve" => {
                expect(3)?;
                Ok(Op::Reserve {
                    pair: pair(args[0])?,
                    fg: color(args[1])?,
                    bg: color(args[2])?,
                })
            }
            "release" => {
                expect(1)?;
                Ok(Op::Release {
                    pair: pair(args[0])?,
                })
            }
            "teardown" => expect(0).map(|_| Op::Teardown),
            "dump" => expect(0).map(|_| Op::Dump),
            "stats" => expect(0).map(|_| Op::Stats),
            other => Err(format!("unknown operation '{}'", other)),
        }
    }
}

fn color(word: &str) -> std::result::Result<ColorId, String> {
    word.parse()
        .map_err(|_| format!("'{}' is not a color number", word))
}

/// Numbers that do not fit a pair id map to `u16::MAX`, which no table can
/// hold, so the allocator rejects them as an invalid pair.
fn pair(word: &str) -> std::result::Result<PairId, String> {
    word.parse::<i64>()
        .map(|n| PairId(u16::try_from(n).unwrap_or(u16::MAX)))
        .map_err(|_| format!("'{}' is not a pair number", word))
}

/// Parse a script into operations tagged with their 1-based line numbers
pub fn parse_script(text: &str) -> Result<Vec<(usize, Op)>> {
    text.lines()
        .enumerate()
        .filter_map(|(n, line)| {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                None
            } else {
                Some((n + 1, line))
            }
        })
        .map(|(line, op)| {
            op.parse::<Op>()
                .map(|op| (line, op))
                .map_err(|message| Error::Script { line, message })
        })
        .collect()
}

/// Result of one scripted operation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Outcome {
    Allocated { fg: ColorId, bg: ColorId, pair: PairId },
    Found { fg: ColorId, bg: ColorId, pair: Option<PairId> },
    Reserved { pair: PairId, fg: ColorId, bg: ColorId },
    Released { pair: PairId },
    TornDown { drained: usize },
    Dump { recent: Vec<PairId>, slots: String },
    Stats(PairStats),
    Failed { line: usize, error: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Allocated { fg, bg, pair } => write!(f, "alloc ({},{}) -> {}", fg, bg, pair),
            Outcome::Found { fg, bg, pair: Some(pair) } => {
                write!(f, "find ({},{}) -> {}", fg, bg, pair)
            }
            Outcome::Found { fg, bg, pair: None } => write!(f, "find ({},{}) -> not found", fg, bg),
            Outcome::Reserved { pair, fg, bg } => write!(f, "reserve {} = ({},{})", pair, fg, bg),
            Outcome::Released { pair } => write!(f, "release {}", pair),
            Outcome::TornDown { drained } => write!(f, "teardown: {} pairs released", drained),
            Outcome::Dump { recent, slots } => {
                let order: Vec<String> = recent.iter().map(|p| p.to_string()).collect();
                write!(f, "recent [{}] slots{}", order.join(" "), slots)
            }
            Outcome::Stats(stats) => write!(
                f,
                "stats: {}/{} used, {} hits, {} misses, {} evictions",
                stats.used, stats.capacity, stats.hits, stats.misses, stats.evictions
            ),
            Outcome::Failed { line, error } => write!(f, "line {}: {}", line, error),
        }
    }
}

/// Apply one operation. Allocator errors become `Outcome::Failed`.
pub fn apply<O: PairObserver>(pairs: &mut PairAllocator<O>, line: usize, op: Op) -> Outcome {
    let result = match op {
        Op::Alloc { fg, bg } => pairs
            .allocate(fg, bg)
            .map(|pair| Outcome::Allocated { fg, bg, pair }),
        Op::Find { fg, bg } => Ok(Outcome::Found {
            fg,
            bg,
            pair: pairs.find(fg, bg),
        }),
        Op::Reserve { pair, fg, bg } => pairs
            .reserve(pair, fg, bg)
            .map(|_| Outcome::Reserved { pair, fg, bg }),
        Op::Release { pair } => pairs.release(pair).map(|_| Outcome::Released { pair }),
        Op::Teardown => Ok(Outcome::TornDown {
            drained: pairs.teardown(),
        }),
        Op::Dump => Ok(Outcome::Dump {
            recent: pairs.recent().collect(),
            slots: pairs.dump(),
        }),
        Op::Stats => Ok(Outcome::Stats(pairs.stats())),
    };

    result.unwrap_or_else(|e| Outcome::Failed {
        line,
        error: e.to_string(),
    })
}

/// Parse and run a whole script against `pairs`
pub fn run_script<O: PairObserver>(
    pairs: &mut PairAllocator<O>,
    text: &str,
    trace_lists: bool,
) -> Result<Vec<Outcome>> {
    let ops = parse_script(text)?;
    let mut outcomes = Vec::with_capacity(ops.len());
    for (line, op) in ops {
        let outcome = apply(pairs, line, op);
        if trace_lists {
            debug!(line, list = %pairs.dump(), "After {:?}", op);
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
