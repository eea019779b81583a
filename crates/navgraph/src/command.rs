//! Text command surface for debugging and operations
//!
//! Commands are space-separated words dispatched against the engine. The
//! surface only triggers state mutations that exist as engine operations;
//! it carries no logic of its own.

use super::engine::NavEngine;
use super::graph::AreaId;

const USAGE: &str = "usage: breaker status|clear|block <a> <b>|unblock <a> <b> \
                     | processor start|stop|status | recalc";

/// Dispatches one command line and returns the text response
pub fn dispatch(engine: &mut NavEngine, line: &str) -> String {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["breaker", "status"] => breaker_status(engine),
        ["breaker", "clear"] => {
            engine.clear_failures();
            "failure records cleared".to_string()
        }
        ["breaker", "block", a, b] => match parse_edge(a, b) {
            Some((from, to)) => {
                engine.block_edge(from, to);
                format!("blocked {from}->{to}")
            }
            None => USAGE.to_string(),
        },
        ["breaker", "unblock", a, b] => match parse_edge(a, b) {
            Some((from, to)) => {
                engine.unblock_edge(from, to);
                format!("unblocked {from}->{to}")
            }
            None => USAGE.to_string(),
        },
        ["processor", "start"] => {
            engine.recalculate_costs();
            "processing restarted".to_string()
        }
        ["processor", "stop"] => {
            engine.stop_processing();
            "processing stopped".to_string()
        }
        ["processor", "status"] => {
            let status = engine.processor_status();
            format!(
                "phase {:?}, {} items remaining, batch {}, {} processed",
                status.phase, status.remaining, status.batch, status.processed
            )
        }
        ["recalc"] => {
            engine.recalculate_costs();
            "cost recalculation started".to_string()
        }
        _ => USAGE.to_string(),
    }
}

fn breaker_status(engine: &NavEngine) -> String {
    let mut lines: Vec<String> = engine
        .failure_records()
        .map(|((from, to), record)| {
            format!(
                "{from}->{to}: {} failures, last at {}{}",
                record.count,
                record.last_failure,
                if record.blocked { ", BLOCKED" } else { "" }
            )
        })
        .collect();
    if lines.is_empty() {
        return "no failure records".to_string();
    }
    lines.sort();
    lines.join("\n")
}

fn parse_edge(a: &str, b: &str) -> Option<(AreaId, AreaId)> {
    let from = a.parse::<u32>().ok()?;
    let to = b.parse::<u32>().ok()?;
    Some((AreaId::new(from), AreaId::new(to)))
}
