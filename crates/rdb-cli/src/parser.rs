//! A minimal, explicitly non-normative reader for the literal SQL surface:
//!
//! ```text
//! CREATE TABLE name (col type [KEY] [INDEX kind], ...);
//! CREATE TABLE name FROM FILE 'path' [USING INDEX kind(col)];
//! INSERT INTO name VALUES (v1, v2, ...);
//! SELECT cols FROM name [WHERE col = v | col BETWEEN a AND b];
//! DELETE FROM name WHERE col = v;
//! DROP TABLE name;
//! ```
//!
//! This is not the SQL frontend the engine treats as an external
//! collaborator; it exists so the engine can be driven interactively and
//! exercised end to end without one.

use rdb_codec::{ColumnType, Value};
use rdb_engine::{ColumnSpec, Filter, Query, TableManager, INDEX_KIND_BPLUS};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub fn parse(line: &str, manager: &TableManager) -> Result<Query, String> {
    let trimmed = line.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err("empty statement".to_string());
    }
    let upper = trimmed.to_uppercase();

    if upper.starts_with("CREATE TABLE") {
        parse_create(trimmed)
    } else if upper.starts_with("INSERT INTO") {
        parse_insert(trimmed, manager)
    } else if upper.starts_with("SELECT") {
        parse_select(trimmed, manager)
    } else if upper.starts_with("DELETE FROM") {
        parse_delete(trimmed, manager)
    } else if upper.starts_with("DROP TABLE") {
        parse_drop(trimmed)
    } else {
        Err(format!("unrecognized statement: {}", trimmed))
    }
}

/// Splits `s` on top-level occurrences of `sep`, treating single-quoted
/// substrings as atomic so a quoted value may itself contain `sep`.
fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in s.chars() {
        if c == '\'' {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c == sep && !in_quotes {
            parts.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    parts.push(current.trim().to_string());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn between_parens(s: &str) -> Option<&str> {
    let start = s.find('(')?;
    let end = s.rfind(')')?;
    if end <= start {
        return None;
    }
    Some(&s[start + 1..end])
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn parse_type(type_str: &str) -> Result<ColumnType, String> {
    let upper = type_str.to_uppercase();
    if upper == "INT" {
        Ok(ColumnType::Int)
    } else if upper == "FLOAT" {
        Ok(ColumnType::Float)
    } else if upper == "DATE" {
        Ok(ColumnType::Date)
    } else if upper == "ARRAY[FLOAT]" {
        Ok(ColumnType::ArrayFloat)
    } else if upper.starts_with("VARCHAR[") && upper.ends_with(']') {
        let n: usize = upper[8..upper.len() - 1]
            .parse()
            .map_err(|_| format!("bad VARCHAR width in '{}'", type_str))?;
        Ok(ColumnType::Varchar(n))
    } else {
        Err(format!("unknown column type '{}'", type_str))
    }
}

fn literal_to_value(raw: &str, col_type: &ColumnType) -> Result<Value, String> {
    let raw = unquote(raw);
    match col_type {
        ColumnType::Int => raw.parse::<i32>().map(Value::Int).map_err(|_| format!("'{}' is not an INT", raw)),
        ColumnType::Float => raw.parse::<f32>().map(Value::Float).map_err(|_| format!("'{}' is not a FLOAT", raw)),
        ColumnType::Date => rdb_codec::parse_date(raw).map(Value::Date).ok_or_else(|| format!("'{}' is not a DATE", raw)),
        ColumnType::Varchar(_) => Ok(Value::Varchar(raw.to_string())),
        ColumnType::ArrayFloat => {
            let mut parts = raw.splitn(2, ',');
            let x: f32 = parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(|| format!("'{}' is not an ARRAY[FLOAT]", raw))?;
            let y: f32 = parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(|| format!("'{}' is not an ARRAY[FLOAT]", raw))?;
            Ok(Value::ArrayFloat(x, y))
        }
    }
}

fn parse_create(trimmed: &str) -> Result<Query, String> {
    let rest = trimmed["CREATE TABLE".len()..].trim();
    let upper_rest = rest.to_uppercase();

    if let Some(from_idx) = upper_rest.find("FROM FILE") {
        let table_name = rest[..from_idx].trim().to_string();
        let after = rest[from_idx + "FROM FILE".len()..].trim();
        let quote_end = after
            .strip_prefix('\'')
            .and_then(|s| s.find('\''))
            .ok_or("expected a quoted file path after FROM FILE")?;
        let file_path = PathBuf::from(&after[1..1 + quote_end]);
        let remainder = after[1 + quote_end + 1..].trim();

        let mut indexes = BTreeMap::new();
        let remainder_upper = remainder.to_uppercase();
        if let Some(using_idx) = remainder_upper.find("USING INDEX") {
            let spec = remainder[using_idx + "USING INDEX".len()..].trim();
            let paren_start = spec.find('(').ok_or("expected 'kind(col)' after USING INDEX")?;
            let kind = spec[..paren_start].trim().to_lowercase();
            let col = between_parens(spec).ok_or("expected 'kind(col)' after USING INDEX")?;
            indexes.insert(unquote(col).to_string(), kind);
        }

        return Ok(Query::CreateFromFile {
            table_name,
            file_path,
            indexes,
        });
    }

    let paren_start = rest.find('(').ok_or("expected '(' in CREATE TABLE")?;
    let table_name = rest[..paren_start].trim().to_string();
    let body = between_parens(rest).ok_or("expected matching ')' in CREATE TABLE")?;

    let mut columns = Vec::new();
    let mut indexes = BTreeMap::new();
    let mut primary_key = None;

    for col_def in split_top_level(body, ',') {
        let tokens: Vec<&str> = col_def.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(format!("malformed column definition: '{}'", col_def));
        }
        let name = tokens[0].to_string();
        let col_type = parse_type(tokens[1])?;

        let mut i = 2;
        while i < tokens.len() {
            match tokens[i].to_uppercase().as_str() {
                "KEY" => {
                    primary_key = Some(name.clone());
                    i += 1;
                }
                "INDEX" => {
                    let kind = tokens.get(i + 1).ok_or("expected an index kind after INDEX")?;
                    indexes.insert(name.clone(), kind.to_lowercase());
                    i += 2;
                }
                other => return Err(format!("unexpected token '{}' in column definition", other)),
            }
        }

        columns.push(ColumnSpec::new(name, col_type));
    }

    if let Some(pk) = &primary_key {
        indexes.insert(pk.clone(), INDEX_KIND_BPLUS.to_string());
    }

    Ok(Query::Create {
        table_name,
        columns,
        indexes,
        primary_key,
    })
}

fn parse_insert(trimmed: &str, manager: &TableManager) -> Result<Query, String> {
    let rest = trimmed["INSERT INTO".len()..].trim();
    let upper_rest = rest.to_uppercase();
    let values_idx = upper_rest.find("VALUES").ok_or("expected VALUES in INSERT")?;
    let table_name = rest[..values_idx].trim().to_string();
    let values_clause = &rest[values_idx + "VALUES".len()..];
    let body = between_parens(values_clause).ok_or("expected '(' ... ')' after VALUES")?;
    let raw_values = split_top_level(body, ',');

    let descriptor = manager.get_table_info(&table_name).map_err(|e| e.to_string())?;
    if raw_values.len() != descriptor.schema.columns.len() {
        return Err(format!(
            "expected {} values for table '{}', got {}",
            descriptor.schema.columns.len(),
            table_name,
            raw_values.len()
        ));
    }

    let mut values = Vec::with_capacity(raw_values.len());
    for (raw, col) in raw_values.iter().zip(descriptor.schema.columns.iter()) {
        values.push(literal_to_value(raw, &col.col_type)?);
    }

    Ok(Query::Insert { table_name, values })
}

fn parse_select(trimmed: &str, manager: &TableManager) -> Result<Query, String> {
    let rest = &trimmed["SELECT".len()..];
    let upper_rest = rest.to_uppercase();
    let from_idx = upper_rest.find("FROM").ok_or("expected FROM in SELECT")?;
    let columns_clause = rest[..from_idx].trim();
    let columns: Vec<String> = if columns_clause == "*" {
        Vec::new()
    } else {
        split_top_level(columns_clause, ',')
    };

    let after_from = rest[from_idx + "FROM".len()..].trim();
    let upper_after = after_from.to_uppercase();
    let (table_name, where_clause) = match upper_after.find("WHERE") {
        Some(where_idx) => (after_from[..where_idx].trim().to_string(), Some(after_from[where_idx + "WHERE".len()..].trim())),
        None => (after_from.to_string(), None),
    };

    let filters = match where_clause {
        Some(clause) => {
            let descriptor = manager.get_table_info(&table_name).map_err(|e| e.to_string())?;
            vec![parse_filter(clause, &descriptor.schema)?]
        }
        None => Vec::new(),
    };

    Ok(Query::Select {
        table_name,
        columns,
        filters,
    })
}

fn parse_delete(trimmed: &str, manager: &TableManager) -> Result<Query, String> {
    let rest = trimmed["DELETE FROM".len()..].trim();
    let upper_rest = rest.to_uppercase();
    let where_idx = upper_rest.find("WHERE").ok_or("DELETE requires a WHERE clause")?;
    let table_name = rest[..where_idx].trim().to_string();
    let clause = rest[where_idx + "WHERE".len()..].trim();

    let descriptor = manager.get_table_info(&table_name).map_err(|e| e.to_string())?;
    let filter = parse_filter(clause, &descriptor.schema)?;
    Ok(Query::Delete {
        table_name,
        filters: vec![filter],
    })
}

fn parse_drop(trimmed: &str) -> Result<Query, String> {
    let table_name = trimmed["DROP TABLE".len()..].trim().to_string();
    if table_name.is_empty() {
        return Err("expected a table name after DROP TABLE".to_string());
    }
    Ok(Query::Drop { table_name })
}

fn parse_filter(clause: &str, schema: &rdb_codec::Schema) -> Result<Filter, String> {
    let upper = clause.to_uppercase();
    if let Some(between_idx) = upper.find("BETWEEN") {
        let column = clause[..between_idx].trim().to_string();
        let and_idx = upper.find(" AND ").ok_or("expected AND in BETWEEN clause")?;
        let from_raw = clause[between_idx + "BETWEEN".len()..and_idx].trim();
        let to_raw = clause[and_idx + " AND ".len()..].trim();
        let col_type = column_type_of(schema, &column)?;
        Ok(Filter::Between {
            column,
            from: literal_to_value(from_raw, &col_type)?,
            to: literal_to_value(to_raw, &col_type)?,
        })
    } else if let Some(eq_idx) = clause.find('=') {
        let column = clause[..eq_idx].trim().to_string();
        let raw = clause[eq_idx + 1..].trim();
        let col_type = column_type_of(schema, &column)?;
        Ok(Filter::Eq {
            column,
            value: literal_to_value(raw, &col_type)?,
        })
    } else {
        Err(format!("unsupported filter clause: '{}'", clause))
    }
}

fn column_type_of(schema: &rdb_codec::Schema, column: &str) -> Result<ColumnType, String> {
    schema
        .column_index(column)
        .map(|idx| schema.columns[idx].col_type.clone())
        .ok_or_else(|| format!("no such column '{}'", column))
}
