//! FILENAME: app/server/src/session.rs
// PURPOSE: A document session: one document, one calculation engine.
// CONTEXT: Both stores hold the same sheet names. Structural changes
//          (add/remove/rename sheet) touch the engine first, since it is the
//          side that can refuse, then the document, which cannot. A refused
//          change therefore leaves both stores untouched.

use crate::error::ToolError;
use crate::sync;
use crate::{log_debug, log_info, log_warn};
use engine::{CalcEngine, EngineConfig, SheetId};
use persistence::{Workbook, DEFAULT_SHEET_NAME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A sheet argument: its name, or its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Index(i) => write!(f, "at index {}", i),
            SheetRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        SheetRef::Name(name.to_string())
    }
}

impl From<usize> for SheetRef {
    fn from(index: usize) -> Self {
        SheetRef::Index(index)
    }
}

#[derive(Debug)]
pub struct Session {
    pub document: Workbook,
    pub engine: CalcEngine,
    /// Last path this workbook was opened from or saved to.
    pub file_path: Option<PathBuf>,
}

impl Session {
    /// A blank workbook: one `Sheet1` in both stores.
    pub fn new(config: EngineConfig) -> Result<Self, ToolError> {
        let mut engine = CalcEngine::new(config);
        engine.add_sheet(DEFAULT_SHEET_NAME)?;
        Ok(Session {
            document: Workbook::new(),
            engine,
            file_path: None,
        })
    }

    /// Wraps a loaded document: registers a same-named engine sheet for each
    /// document sheet, in order, then pushes every sheet's content.
    pub fn from_document(
        document: Workbook,
        config: EngineConfig,
        file_path: Option<PathBuf>,
    ) -> Result<Self, ToolError> {
        if document.sheets.is_empty() {
            return Err(ToolError::FileFormatError(
                "workbook contains no sheets".to_string(),
            ));
        }

        let mut engine = CalcEngine::new(config);
        for sheet in &document.sheets {
            engine.add_sheet(&sheet.name)?;
        }

        let mut session = Session {
            document,
            engine,
            file_path,
        };
        for name in session.document.sheet_names() {
            sync::sync_sheet_to_engine(&mut session, &name)?;
        }
        Ok(session)
    }

    // ========================================================================
    // SHEET LOOKUP
    // ========================================================================

    /// Resolves a sheet argument to the sheet's current name.
    pub fn resolve_sheet(&self, sheet: &SheetRef) -> Result<String, ToolError> {
        let found = match sheet {
            SheetRef::Name(name) => self.document.sheet(name).map(|s| s.name.clone()),
            SheetRef::Index(index) => index
                .checked_sub(1)
                .and_then(|i| self.document.sheets.get(i))
                .map(|s| s.name.clone()),
        };
        found.ok_or_else(|| ToolError::SheetNotFound(sheet.to_string()))
    }

    /// 1-based position of the named sheet.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.document.position(name).map(|i| i + 1)
    }

    pub fn sheet_count(&self) -> usize {
        self.document.sheets.len()
    }

    pub fn engine_sheet(&self, name: &str) -> Option<SheetId> {
        self.engine.sheet_id(name)
    }

    // ========================================================================
    // STRUCTURAL MUTATIONS
    // ========================================================================

    /// Adds an empty sheet at the end. Returns its 1-based index.
    pub fn add_sheet(&mut self, name: &str) -> Result<usize, ToolError> {
        validate_sheet_name(name)?;
        if self.document.sheet(name).is_some() {
            return Err(ToolError::SheetAlreadyExists(name.to_string()));
        }

        self.engine.add_sheet(name)?;
        self.document.add_sheet(name.to_string());
        log_info!("SYNC", "added sheet '{}'", name);
        Ok(self.document.sheets.len())
    }

    pub fn remove_sheet(&mut self, name: &str) -> Result<(), ToolError> {
        let position = self
            .document
            .position(name)
            .ok_or_else(|| ToolError::SheetNotFound(format!("'{}'", name)))?;
        if self.document.sheets.len() == 1 {
            return Err(ToolError::LastSheet(name.to_string()));
        }

        match self.engine_sheet(name) {
            Some(id) => self.engine.remove_sheet(id)?,
            None => log_warn!("SYNC", "remove '{}': no engine sheet, removing document sheet only", name),
        }
        self.document.sheets.remove(position);
        log_info!("SYNC", "removed sheet '{}'", name);
        Ok(())
    }

    /// Renames a sheet in both stores. Returns its 1-based index.
    pub fn rename_sheet(&mut self, name: &str, new_name: &str) -> Result<usize, ToolError> {
        validate_sheet_name(new_name)?;
        let position = self
            .document
            .position(name)
            .ok_or_else(|| ToolError::SheetNotFound(format!("'{}'", name)))?;
        if name == new_name {
            log_debug!("SYNC", "rename '{}': name unchanged", name);
            return Ok(position + 1);
        }
        if self.document.sheet(new_name).is_some() {
            return Err(ToolError::SheetAlreadyExists(new_name.to_string()));
        }

        match self.engine_sheet(name) {
            Some(id) => self.engine.rename_sheet(id, new_name)?,
            None => log_warn!("SYNC", "rename '{}': no engine sheet, renaming document sheet only", name),
        }
        self.document.sheets[position].name = new_name.to_string();
        log_info!("SYNC", "renamed sheet '{}' -> '{}'", name, new_name);
        Ok(position + 1)
    }

    /// Releases the engine. The document is dropped with the session.
    pub fn destroy(self) {
        self.engine.destroy();
    }
}

fn validate_sheet_name(name: &str) -> Result<(), ToolError> {
    if name.trim().is_empty() {
        return Err(ToolError::InvalidArgument(
            "Sheet name must not be empty".to_string(),
        ));
    }
    Ok(())
}
