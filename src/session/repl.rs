//! Interactive REPL (Read-Eval-Print Loop) for the plan simulator.

use std::io::{self, BufRead, Write};

use super::samples::{DEFAULT_QUERY, SAMPLE_QUERIES};
use super::workbench::{SessionResult, Workbench};
use crate::planner::{PlanComparison, RuleId};

/// REPL configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Prompt string.
    pub prompt: String,
    /// Show timing information.
    pub timing: bool,
    /// Print the plan details after each query.
    pub details: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "plansim> ".into(),
            timing: false,
            details: true,
        }
    }
}

/// The interactive REPL.
pub struct Repl {
    workbench: Workbench,
    config: ReplConfig,
    history: Vec<String>,
}

impl Repl {
    /// Create a new REPL over the given workbench.
    pub fn new(workbench: Workbench) -> Self {
        Self::with_config(workbench, ReplConfig::default())
    }

    /// Create a REPL with custom configuration.
    pub fn with_config(workbench: Workbench, config: ReplConfig) -> Self {
        Self {
            workbench,
            config,
            history: Vec::new(),
        }
    }

    pub fn workbench(&self) -> &Workbench {
        &self.workbench
    }

    /// Run the REPL on stdin/stdout.
    pub fn run(&mut self) -> SessionResult<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the REPL on arbitrary input and output.
    pub fn run_with(&mut self, mut input: impl BufRead, mut out: impl Write) -> SessionResult<()> {
        self.print_banner(&mut out)?;

        let mut buffer = String::new();
        let mut multiline = false;

        loop {
            // Print prompt.
            let prompt = if multiline { "      -> " } else { &self.config.prompt };
            write!(out, "{}", prompt)?;
            out.flush()?;

            // Read line.
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out, "\nGoodbye!")?;
                break;
            }

            let line = line.trim_end();

            if line.is_empty() && !multiline {
                continue;
            }

            // Accumulate multi-line input.
            if multiline {
                buffer.push(' ');
            }
            buffer.push_str(line);

            // SQL continues until a semicolon.
            if !buffer.ends_with(';') && !is_command(&buffer) {
                multiline = true;
                continue;
            }
            multiline = false;

            let cmd = buffer.trim().to_string();
            buffer.clear();

            if cmd.is_empty() {
                continue;
            }

            self.history.push(cmd.clone());

            if is_command(&cmd) {
                match self.handle_command(&cmd, &mut out) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
                continue;
            }

            let start = std::time::Instant::now();
            match self.workbench.submit(&cmd) {
                Ok(comparison) => {
                    print_comparison(&mut out, comparison, self.config.details)?;
                    if self.config.timing {
                        writeln!(out, "Time: {:.3}ms", start.elapsed().as_secs_f64() * 1000.0)?;
                    }
                }
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
        }

        Ok(())
    }

    fn print_banner(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Query plan simulator v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(
            out,
            "{} tables loaded. Type .help for commands, or enter a SELECT ending in ';'",
            self.workbench.catalog().len()
        )?;
        writeln!(out)
    }

    /// Handle a dot command. Returns true when the REPL should exit.
    fn handle_command(&mut self, cmd: &str, out: &mut impl Write) -> SessionResult<bool> {
        let cmd = cmd.trim_start_matches(&['.', '\\'][..]);
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let command = parts.first().map(|s| s.to_lowercase());

        match command.as_deref() {
            Some("help") | Some("h") | Some("?") => print_help(out)?,
            Some("quit") | Some("exit") | Some("q") => return Ok(true),
            Some("tables") | Some("dt") => self.list_tables(out)?,
            Some("schema") | Some("describe") | Some("d") => match parts.get(1) {
                Some(table) => self.describe_table(table, out)?,
                None => writeln!(out, "Usage: .schema <table_name>")?,
            },
            Some("rules") => self.list_rules(out)?,
            Some("toggle") => match parts.get(1) {
                Some(id) => {
                    let id: RuleId = id.parse()?;
                    let enabled = self.workbench.toggle_rule(id)?;
                    writeln!(out, "{}: {}", id.name(), if enabled { "on" } else { "off" })?;
                    if let Ok(comparison) = self.workbench.comparison() {
                        print_comparison(out, comparison, self.config.details)?;
                    }
                }
                None => writeln!(out, "Usage: .toggle <rule_id>")?,
            },
            Some("samples") => {
                for sample in SAMPLE_QUERIES {
                    writeln!(out, "  {:<14} {}", sample.id, sample.description)?;
                }
            }
            Some("sample") => match parts.get(1) {
                Some(id) => {
                    self.workbench.load_sample(id)?;
                    writeln!(out, "{}", self.workbench.query().unwrap_or_default())?;
                    print_comparison(out, self.workbench.comparison()?, self.config.details)?;
                }
                None => writeln!(out, "Usage: .sample <id>")?,
            },
            Some("export") => match parts.get(1) {
                Some(path) => {
                    self.workbench.export_to(path)?;
                    writeln!(out, "Exported to {}", path)?;
                }
                None => writeln!(out, "{}", self.workbench.export_json()?)?,
            },
            Some("history") => {
                for (i, cmd) in self.history.iter().enumerate() {
                    writeln!(out, "{:4}  {}", i + 1, cmd)?;
                }
            }
            Some("timing") => {
                self.config.timing = !self.config.timing;
                writeln!(out, "Timing: {}", if self.config.timing { "on" } else { "off" })?;
            }
            Some(other) => {
                writeln!(out, "Unknown command: .{}", other)?;
                writeln!(out, "Type .help for available commands")?;
            }
            None => {}
        }

        Ok(false)
    }

    fn list_tables(&self, out: &mut impl Write) -> io::Result<()> {
        let catalog = self.workbench.catalog();
        if catalog.is_empty() {
            return writeln!(out, "No tables found.");
        }
        writeln!(out, "Tables:")?;
        for table in catalog.tables() {
            writeln!(out, "  {} ({} rows)", table.name, table.row_count)?;
        }
        Ok(())
    }

    fn describe_table(&self, name: &str, out: &mut impl Write) -> io::Result<()> {
        match self.workbench.catalog().table(name) {
            Some(schema) => {
                writeln!(out, "Table: {} ({} rows)", schema.name, schema.row_count)?;
                writeln!(out, "Columns:")?;
                for column in &schema.columns {
                    writeln!(out, "  {}", column)?;
                }
                Ok(())
            }
            None => writeln!(out, "Table not found: {}", name),
        }
    }

    fn list_rules(&self, out: &mut impl Write) -> io::Result<()> {
        for rule in self.workbench.rules() {
            let mark = if rule.enabled { "x" } else { " " };
            writeln!(out, "  [{}] {:<22} {}", mark, rule.id, rule.description)?;
        }
        Ok(())
    }
}

fn is_command(input: &str) -> bool {
    input.starts_with('.') || input.starts_with('\\')
}

fn print_comparison(
    out: &mut impl Write,
    comparison: &PlanComparison,
    details: bool,
) -> io::Result<()> {
    writeln!(out, "Naive {}", comparison.naive())?;
    writeln!(out, "Optimized {}", comparison.optimized())?;
    let improvement = comparison.improvement();
    writeln!(
        out,
        "Cost reduction: {:.2} ({:.1}%)",
        improvement.cost_reduction, improvement.percentage_improvement
    )?;
    if details {
        for note in comparison.details() {
            writeln!(out, "  - {}", note)?;
        }
    }
    Ok(())
}

fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  .help, .h, .?           Show this help message")?;
    writeln!(out, "  .quit, .exit, .q        Exit the REPL")?;
    writeln!(out, "  .tables, .dt            List catalog tables")?;
    writeln!(out, "  .schema <table>         Show table columns and indexes")?;
    writeln!(out, "  .rules                  List optimization rules")?;
    writeln!(out, "  .toggle <rule_id>       Enable or disable a rule and re-optimize")?;
    writeln!(out, "  .samples                List sample queries")?;
    writeln!(out, "  .sample <id>            Plan a sample query")?;
    writeln!(out, "  .export [path]          Print or write the plans as JSON")?;
    writeln!(out, "  .history                Show command history")?;
    writeln!(out, "  .timing                 Toggle timing display")?;
    writeln!(out)?;
    writeln!(out, "Queries:")?;
    writeln!(out, "  SELECT cols FROM table [JOIN ...] [WHERE ...];")?;
    writeln!(out, "  e.g. {}", DEFAULT_QUERY)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::io::Cursor;

    fn run(script: &str) -> String {
        let mut repl = Repl::new(Workbench::new(Catalog::sample()));
        let mut out = Vec::new();
        repl.run_with(Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_multiline_query() {
        let out = run("SELECT * FROM customers\nWHERE country = \"USA\";\n.quit\n");
        assert!(out.contains("Naive Plan (estimated cost: 5500.00"));
        assert!(out.contains("Optimized Plan (estimated cost: 1500.00"));
        assert!(!out.contains("Goodbye!"));
    }

    #[test]
    fn test_toggle_and_rules() {
        let out = run(".toggle index_selection\n.rules\n");
        assert!(out.contains("Index Selection: off"));
        assert!(out.contains("[ ] index_selection"));
        assert!(out.contains("[x] join_reordering"));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[test]
    fn test_errors_are_reported() {
        let out = run(".toggle nonsense\nUPDATE t SET x = 1;\n.export\n");
        assert!(out.contains("unknown optimization rule: nonsense"));
        assert!(out.contains("Error: invalid query: query must start with SELECT"));
        assert!(out.contains("Error: no query has been planned yet"));
    }

    #[test]
    fn test_help_shows_example_query() {
        let out = run(".help\n");
        assert!(out.contains(".toggle <rule_id>"));
        assert!(out.contains(DEFAULT_QUERY));
    }

    #[test]
    fn test_sample_and_schema() {
        let out = run(".sample simple_join\n.schema orders\n.tables\n");
        assert!(out.contains("JOIN orders o ON c.id = o.customer_id"));
        assert!(out.contains("Table: orders (50000 rows)"));
        assert!(out.contains("status VARCHAR(20) (indexed)"));
        assert!(out.contains("  products (1000 rows)"));
    }
}
