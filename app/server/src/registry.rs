//! FILENAME: app/server/src/registry.rs
// PURPOSE: The table of open workbooks, keyed by opaque handle.
// CONTEXT: Handles are issued as wb_1, wb_2, ... and never reused, even
//          after a workbook is closed. Owned by AppState; nothing global.

use crate::api_types::WorkbookSummary;
use crate::error::ToolError;
use crate::session::Session;
use crate::{log_info, log_warn};
use engine::EngineConfig;
use persistence::load_xlsx;
use std::collections::HashMap;
use std::path::Path;

pub const HANDLE_PREFIX: &str = "wb_";

#[derive(Debug)]
pub struct WorkbookRegistry {
    sessions: HashMap<String, Session>,
    /// Handles in creation order.
    order: Vec<String>,
    next_id: u64,
    engine_config: EngineConfig,
}

impl WorkbookRegistry {
    pub fn new(engine_config: EngineConfig) -> Self {
        WorkbookRegistry {
            sessions: HashMap::new(),
            order: Vec::new(),
            next_id: 1,
            engine_config,
        }
    }

    fn insert(&mut self, session: Session) -> String {
        let handle = format!("{}{}", HANDLE_PREFIX, self.next_id);
        self.next_id += 1;
        self.sessions.insert(handle.clone(), session);
        self.order.push(handle.clone());
        handle
    }

    /// Registers a blank workbook with a single `Sheet1`.
    pub fn create(&mut self) -> Result<String, ToolError> {
        let session = Session::new(self.engine_config)?;
        let handle = self.insert(session);
        log_info!("REG", "created {}", handle);
        Ok(handle)
    }

    /// Loads a workbook file and registers it. The path is remembered.
    pub fn open(&mut self, path: &Path) -> Result<String, ToolError> {
        let document = load_xlsx(path)?;
        let session = Session::from_document(document, self.engine_config, Some(path.to_path_buf()))?;
        let handle = self.insert(session);
        log_info!("REG", "opened {} from {:?}", handle, path);
        Ok(handle)
    }

    pub fn get(&self, handle: &str) -> Result<&Session, ToolError> {
        self.sessions
            .get(handle)
            .ok_or_else(|| ToolError::WorkbookNotFound(handle.to_string()))
    }

    pub fn get_mut(&mut self, handle: &str) -> Result<&mut Session, ToolError> {
        self.sessions
            .get_mut(handle)
            .ok_or_else(|| ToolError::WorkbookNotFound(handle.to_string()))
    }

    /// Releases the session's engine and forgets the handle.
    pub fn close(&mut self, handle: &str) -> Result<(), ToolError> {
        let session = self.sessions.remove(handle).ok_or_else(|| {
            log_warn!("REG", "close {}: not open", handle);
            ToolError::WorkbookNotFound(handle.to_string())
        })?;
        self.order.retain(|h| h != handle);
        session.destroy();
        log_info!("REG", "closed {}", handle);
        Ok(())
    }

    /// Snapshot of the open workbooks, in creation order.
    pub fn list(&self) -> Vec<WorkbookSummary> {
        self.order
            .iter()
            .filter_map(|handle| {
                let session = self.sessions.get(handle)?;
                Some(WorkbookSummary {
                    handle: handle.clone(),
                    path: session
                        .file_path
                        .as_ref()
                        .map(|p| p.display().to_string()),
                    sheet_count: session.sheet_count(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
