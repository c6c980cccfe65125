//! # CLI - interactive shell for the storage engine core
//!
//! A REPL-style command-line interface. Reads statements from stdin in the
//! literal SQL surface `parser` understands, executes them against a
//! [`rdb_engine::Runner`], and prints the resulting `{status, message,
//! records}` to stdout.
//!
//! ## Commands
//!
//! ```text
//! CREATE TABLE name (col type [KEY] [INDEX kind], ...);
//! CREATE TABLE name FROM FILE 'path' [USING INDEX kind(col)];
//! INSERT INTO name VALUES (v1, v2, ...);
//! SELECT cols FROM name [WHERE col = v | col BETWEEN a AND b];
//! DELETE FROM name WHERE col = v;
//! DROP TABLE name;
//! EXIT / QUIT
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! RDB_DATA_ROOT         Directory tables live under        (default: "data")
//! RDB_COMPACTION_RATIO  deleted/total ratio triggering      (default: 0.20)
//!                       an inline compaction after DELETE
//! RDB_PAGE_SIZE         documented, fixed at 4096
//! ```

mod parser;

use anyhow::Result;
use rdb_config::EngineConfig;
use rdb_engine::{Query, Runner, Status};
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();

    let config = EngineConfig::from_env();
    log::info!(
        "starting shell (data_root={}, compaction_ratio={})",
        config.data_root.display(),
        config.compaction_ratio
    );
    let runner = Runner::new(config.clone());

    println!(
        "storage engine shell started (data_root={}, compaction_ratio={})",
        config.data_root.display(),
        config.compaction_ratio
    );
    println!("Commands: CREATE TABLE ... | INSERT INTO ... | SELECT ... | DELETE FROM ... | DROP TABLE ...");
    println!("          EXIT | QUIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            print!("> ");
            io::stdout().flush().ok();
            continue;
        }
        match trimmed.to_uppercase().as_str() {
            "EXIT" | "QUIT" => {
                println!("bye");
                break;
            }
            _ => run_statement(&runner, trimmed),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}

fn run_statement(runner: &Runner, line: &str) {
    let query = match parser::parse(line, runner.table_manager()) {
        Ok(q) => q,
        Err(e) => {
            log::warn!("failed to parse statement '{}': {}", line, e);
            println!("ERR {}", e);
            return;
        }
    };
    log::debug!("executing {} statement", query_label(&query));
    print_result(query_label(&query), runner.execute_query(query));
}

fn query_label(query: &Query) -> &'static str {
    match query {
        Query::Create { .. } | Query::CreateFromFile { .. } => "CREATE",
        Query::Insert { .. } => "INSERT",
        Query::Select { .. } => "SELECT",
        Query::Delete { .. } => "DELETE",
        Query::Drop { .. } => "DROP",
        Query::Update => "UPDATE",
    }
}

fn print_result(label: &str, result: rdb_engine::CommandResult) {
    match result.status {
        Status::Error => {
            println!("ERR {}", result.message.unwrap_or_default());
        }
        Status::Success => match result.records {
            Some(records) => {
                let columns = result.columns.unwrap_or_default();
                println!("{}", columns.join(" | "));
                for row in &records {
                    let rendered: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    println!("{}", rendered.join(" | "));
                }
                println!("({} row{})", records.len(), if records.len() == 1 { "" } else { "s" });
            }
            None => {
                println!("OK {}: {}", label, result.message.unwrap_or_default());
            }
        },
    }
}
