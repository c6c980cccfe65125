//! Dispatches a structured [`Query`] to the matching command handler and
//! maps every error onto the `{status, message}` result shape. No error
//! ever escapes [`Runner::execute_query`] as a `Result::Err`; the mapping
//! happens here, once, at the outward-facing boundary.

use crate::commands;
use crate::query::{CommandResult, Query};
use crate::table_manager::TableManager;
use crate::Error;
use rdb_config::EngineConfig;

pub struct Runner {
    manager: TableManager,
    config: EngineConfig,
}

impl Runner {
    pub fn new(config: EngineConfig) -> Self {
        let manager = TableManager::new(config.data_root.clone());
        Self { manager, config }
    }

    pub fn table_manager(&self) -> &TableManager {
        &self.manager
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn execute_query(&self, query: Query) -> CommandResult {
        match self.dispatch(query) {
            Ok(result) => result,
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    fn dispatch(&self, query: Query) -> Result<CommandResult, Error> {
        match query {
            Query::Create {
                table_name,
                columns,
                indexes,
                primary_key,
            } => commands::create_table(&self.manager, &table_name, columns, indexes, primary_key),
            Query::CreateFromFile {
                table_name,
                file_path,
                indexes,
            } => commands::create_from_file(&self.manager, &table_name, &file_path, indexes),
            Query::Insert { table_name, values } => commands::insert(&self.manager, &table_name, values),
            Query::Select {
                table_name,
                columns,
                filters,
            } => commands::select(&self.manager, &table_name, &columns, &filters),
            Query::Delete { table_name, filters } => commands::delete(&self.manager, &self.config, &table_name, &filters),
            Query::Drop { table_name } => commands::drop_table(&self.manager, &table_name),
            Query::Update => Err(Error::NotImplemented("UPDATE".to_string())),
        }
    }
}
