//! Diagnostics sinks for dump mode

/// Receives raw protocol lines while dumping
pub trait DiagnosticsSink {
    /// Called once per observed line
    fn emit_line(&mut self, line: &str);
}

/// Logs each dumped line through `tracing` under the `vedirect::dump` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit_line(&mut self, line: &str) {
        tracing::info!(target: "vedirect::dump", "{}", line);
    }
}

impl<F: FnMut(&str)> DiagnosticsSink for F {
    fn emit_line(&mut self, line: &str) {
        self(line)
    }
}
