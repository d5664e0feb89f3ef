//! FILENAME: app/server/src/lib.rs
// PURPOSE: Main library entry point for the spreadsheet tool server.
// CONTEXT: Every tool call runs to completion against `AppState` before the
//          next is read. Sessions pair a document with a calculation engine;
//          the sync layer keeps the two in agreement.

pub mod api_types;
pub mod coerce;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod pivot;
pub mod registry;
pub mod session;
pub mod sync;

pub use api_types::*;
pub use config::ServerConfig;
pub use dispatch::{dispatch, encode_response, handle_line, ErrorPayload, Request, Response};
pub use error::{ConfigError, ToolError};
pub use logging::{init_log_file, next_seq, set_min_level, write_log, LogLevel};
pub use registry::WorkbookRegistry;
pub use session::{Session, SheetRef};

use std::io::{BufRead, Write};

// ============================================================================
// APPLICATION STATE
// ============================================================================

#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub registry: WorkbookRegistry,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        AppState {
            registry: WorkbookRegistry::new(config.engine),
            config,
        }
    }
}

pub fn create_app_state() -> AppState {
    AppState::new(ServerConfig::default())
}

// ============================================================================
// SERVER LOOP
// ============================================================================

/// Reads requests line by line and answers each on its own line. Returns
/// when the input ends. Tool failures become error responses; only I/O
/// failures on the streams end the loop early.
pub fn serve<R: BufRead, W: Write>(
    state: &mut AppState,
    input: R,
    mut output: W,
) -> std::io::Result<usize> {
    let mut handled = 0;
    for line in input.lines() {
        let line = line?;
        if let Some(response) = handle_line(state, &line) {
            writeln!(output, "{}", encode_response(&response))?;
            output.flush()?;
            handled += 1;
        }
    }
    Ok(handled)
}

/// Loads configuration, sets up logging and serves stdin/stdout.
pub fn run() -> std::io::Result<()> {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[CONFIG] {}; using defaults", e);
            ServerConfig::default()
        }
    };

    set_min_level(config.log_level);
    if let Some(path) = &config.log_file {
        if let Err(e) = init_log_file(path) {
            eprintln!("[LOG_INIT] {}", e);
        }
    }

    log_info!(
        "SYS",
        "sheet-server starting: limits {}x{}, pivot prefix '{}'",
        config.engine.max_rows,
        config.engine.max_columns,
        config.pivot_sheet_prefix
    );

    let mut state = AppState::new(config);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let handled = serve(&mut state, stdin.lock(), stdout.lock())?;

    log_info!(
        "SYS",
        "input closed after {} requests, {} workbooks still open",
        handled,
        state.registry.len()
    );
    Ok(())
}
