use std::cell::Cell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use ::rustyline::error::ReadlineError;
use ::rustyline::DefaultEditor;
use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use parley::interface::{Output, UserInput};
use parley::models::content::{ToolCall, ToolResult};
use serde_json::Value;

use super::thinking::get_random_thinking_message;
use super::Theme;

const PROMPT: &str = "\x1b[1m\x1b[38;5;30mYou:\x1b[0m ";
const MAX_STRING_LENGTH: usize = 40;
const MAX_RESULT_LINES: usize = 12;
const INDENT: &str = "    ";

/// Build the two halves of the terminal front end. They share the theme so
/// `/t` at the prompt changes how replies are rendered.
pub fn terminal() -> Result<(RustylineInput, TerminalOutput)> {
    let theme = Rc::new(Cell::new(Theme::Dark));
    let input = RustylineInput {
        editor: DefaultEditor::new()?,
        theme: Rc::clone(&theme),
    };
    let output = TerminalOutput {
        spinner: spinner(),
        theme,
        pending: HashMap::new(),
    };
    Ok((input, output))
}

pub struct RustylineInput {
    editor: DefaultEditor,
    theme: Rc<Cell<Theme>>,
}

impl RustylineInput {
    /// Handles slash commands. Returns true when the line was one.
    fn command(&mut self, line: &str) -> bool {
        if line.eq_ignore_ascii_case("/t") {
            let theme = self.theme.get().toggle();
            self.theme.set(theme);
            match theme {
                Theme::Light => println!("Switching to Light theme"),
                Theme::Dark => println!("Switching to Dark theme"),
            }
            true
        } else if line.eq_ignore_ascii_case("/?") || line.eq_ignore_ascii_case("/help") {
            println!("Commands:");
            println!("/exit - Exit the session");
            println!("/t - Toggle Light/Dark theme");
            println!("/? | /help - Display this help message");
            println!("Ctrl+C - Interrupt the model or the running tools");
            true
        } else {
            false
        }
    }
}

/// Renders replies as markdown through bat, tool activity as plain styled text.
pub struct TerminalOutput {
    spinner: cliclack::ProgressBar,
    theme: Rc<Cell<Theme>>,
    // call id -> tool name, so results can be labelled
    pending: HashMap<String, String>,
}

impl TerminalOutput {
    pub fn ready(&self) {
        println!(
            "parley is running! {}",
            style("type /help for commands, /exit or Ctrl-D to leave").dim()
        );
        print_newline();
    }

    pub fn notice(&self, text: &str) {
        println!("{}", style(text).yellow());
    }

    /// Forget calls whose results will never arrive, after an interrupted dispatch
    pub fn interrupted(&mut self) {
        self.pending.clear();
        self.notice("Interrupted.");
    }
}

impl UserInput for RustylineInput {
    fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let line = line.trim();

            if line.eq_ignore_ascii_case("/exit") || line.eq_ignore_ascii_case("/quit") {
                return Ok(None);
            }
            if self.command(line) {
                continue;
            }
            if !line.is_empty() {
                let _ = self.editor.add_history_entry(line);
            }
            return Ok(Some(line.to_string()));
        }
    }
}

impl Output for TerminalOutput {
    fn text(&mut self, text: &str) {
        print_markdown(text, self.theme.get().bat_theme());
        print_newline();
        let _ = io::stdout().flush();
    }

    fn tool_call(&mut self, call: &ToolCall) {
        self.pending.insert(call.id.clone(), call.name.clone());
        print_newline();
        println!(
            "─── {} | {} ──────────────────────────",
            style(&call.name),
            style(&call.id).magenta().dim(),
        );
        print_params(&call.input, 0);
    }

    fn tool_result(&mut self, result: &ToolResult) {
        let name = self
            .pending
            .remove(&result.tool_call_id)
            .unwrap_or_else(|| "unknown".to_string());
        if result.is_error {
            println!("{} {}", style(format!("{} failed:", name)).red(), result.output);
            return;
        }

        let lines: Vec<&str> = result.output.lines().collect();
        for line in lines.iter().take(MAX_RESULT_LINES) {
            println!("{}{}", INDENT, style(line).dim());
        }
        if lines.len() > MAX_RESULT_LINES {
            println!(
                "{}{}",
                INDENT,
                style(format!("... {} more lines", lines.len() - MAX_RESULT_LINES)).dim()
            );
        }
        print_newline();
    }

    fn busy(&mut self) {
        self.spinner = spinner();
        self.spinner
            .start(format!("{}...", get_random_thinking_message()));
    }

    fn idle(&mut self) {
        self.spinner.stop("");
    }
}

fn print_markdown(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

/// Format and print tool input recursively, eliding long strings
fn print_params(value: &Value, depth: usize) {
    let indent = INDENT.repeat(depth);

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}{}:", indent, style(key).dim());
                        print_params(val, depth + 1);
                    }
                    _ => println!("{}{}: {}", indent, style(key).dim(), scalar(val)),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}-", indent);
                        print_params(item, depth + 1);
                    }
                    _ => println!("{}- {}", indent, scalar(item)),
                }
            }
        }
        _ => println!("{}{}", indent, scalar(value)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) if s.len() > MAX_STRING_LENGTH => {
            style(format!("[{} chars]", s.len())).yellow().to_string()
        }
        Value::String(s) => style(s).green().to_string(),
        Value::Number(n) => style(n).blue().to_string(),
        Value::Bool(b) => style(b).blue().to_string(),
        Value::Null => style("null").dim().to_string(),
        Value::Object(_) | Value::Array(_) => value.to_string(),
    }
}

fn print_newline() {
    println!();
}
