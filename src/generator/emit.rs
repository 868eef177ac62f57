//! Emission of generated test methods.
//!
//! Every method is written at one indentation level inside the header's test class, with bodies one level
//! deeper. Indentation is always four spaces.

use testbase_core::naming::module_import_path;

use super::classify::{Classification, RunConfiguration};

/// Spaces per indentation level in the generated file.
pub const INDENT_WIDTH: usize = 4;

/// Writer that tracks indentation and builds the generated test file
#[derive(Debug)]
pub struct TestFileWriter {
    /// The output buffer
    output: String,
    /// Current indentation level
    indent_level: usize,
    /// Whether we're at the start of a line
    at_line_start: bool,
}

impl TestFileWriter {
    /// Create a writer whose output starts with `header`, copied verbatim.
    pub fn with_header(header: &str) -> Self {
        Self {
            output: header.to_string(),
            indent_level: 0,
            at_line_start: header.is_empty() || header.ends_with('\n'),
        }
    }

    /// Get the generated output
    pub fn finish(self) -> String {
        self.output
    }

    /// Increase indentation level
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indentation level
    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn write_indent(&mut self) {
        if self.at_line_start {
            self.output.push_str(&" ".repeat(self.indent_level * INDENT_WIDTH));
            self.at_line_start = false;
        }
    }

    /// Write a string (with auto-indent)
    pub fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.write_indent();
        self.output.push_str(s);
    }

    /// Write a string and newline
    pub fn writeln(&mut self, s: &str) {
        self.write(s);
        self.newline();
    }

    /// Write just a newline
    pub fn newline(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// Emit the tests (or the not-testing comment) for one classified script.
    ///
    /// `long_running` adds a warning comment to each runnable method of a script listed as too long.
    pub fn emit_script(
        &mut self,
        name: &str,
        relative_path: &str,
        classification: &Classification,
        long_running: Option<&str>,
    ) {
        match classification {
            Classification::Skip(reason) => self.emit_not_testing(&reason.to_string(), relative_path),
            Classification::RunScriptStyle {
                combined_binaries,
                split_binaries,
            } => {
                for configuration in RunConfiguration::ALL {
                    let binaries = match configuration {
                        RunConfiguration::Combined => combined_binaries,
                        RunConfiguration::Split => split_binaries,
                    };
                    self.emit_run_script(name, relative_path, configuration, binaries, long_running);
                }
            }
            Classification::ImportStyle { skip_imports, binaries } => {
                self.emit_check_script(name, relative_path, skip_imports, binaries, long_running);
            }
        }
    }

    /// Comment block explaining why a script is not tested.
    pub fn emit_not_testing(&mut self, reason: &str, relative_path: &str) {
        self.newline();
        self.indent();
        self.writeln(&format!("# Not testing file due to: {reason}"));
        self.writeln(&format!("# {relative_path}"));
        self.dedent();
    }

    fn emit_check_script(
        &mut self,
        name: &str,
        relative_path: &str,
        skip_imports: &[String],
        binaries: &[String],
        long_running: Option<&str>,
    ) {
        self.open_method(&format!("test_{name}"), long_running);
        for import in skip_imports {
            self.writeln(import);
        }
        let mut call = format!("self.check_script(\"{relative_path}\"");
        if !skip_imports.is_empty() {
            let names: Vec<&str> = skip_imports.iter().map(|s| imported_name(s)).collect();
            call.push_str(&format!(", skip_exceptions=[{}]", names.join(",")));
        }
        call.push(')');
        self.writeln(&call);
        self.emit_binaries(binaries);
        self.close_method();
    }

    fn emit_run_script(
        &mut self,
        name: &str,
        relative_path: &str,
        configuration: RunConfiguration,
        binaries: &[String],
        long_running: Option<&str>,
    ) {
        self.open_method(&format!("test_{name}{}", configuration.suffix()), long_running);
        self.writeln(&format!(
            "from {} import run_script",
            module_import_path(relative_path)
        ));
        let split = if configuration.is_split() { "True" } else { "False" };
        self.writeln(&format!("run_script(split={split})"));
        self.emit_binaries(binaries);
        self.close_method();
    }

    fn emit_binaries(&mut self, binaries: &[String]) {
        if binaries.is_empty() {
            return;
        }
        let quoted: Vec<String> = binaries.iter().map(|b| format!("\"{b}\"")).collect();
        self.writeln(&format!("self.check_binaries_used([{}])", quoted.join(", ")));
    }

    fn open_method(&mut self, method: &str, long_running: Option<&str>) {
        self.newline();
        self.indent();
        self.writeln(&format!("def {method}(self):"));
        self.indent();
        if let Some(duration) = long_running {
            self.writeln(&format!("# Warning this test takes {duration}."));
            self.writeln("# raise skiptest is uncommented on branch tests");
        }
    }

    fn close_method(&mut self) {
        self.dedent();
        self.dedent();
    }
}

/// The symbol a `from X import Y` statement binds.
fn imported_name(statement: &str) -> &str {
    statement.split_whitespace().last().unwrap_or(statement)
}
