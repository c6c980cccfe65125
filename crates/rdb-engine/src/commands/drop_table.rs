use crate::query::CommandResult;
use crate::table_manager::TableManager;
use crate::Error;

/// `DROP TABLE name;`.
pub fn drop_table(manager: &TableManager, table_name: &str) -> Result<CommandResult, Error> {
    manager.drop_table(table_name)?;
    Ok(CommandResult::success(format!("table {} dropped", table_name)))
}
