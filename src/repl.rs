use crate::core::{HrdeskError, Result};
use crate::form::render_form;
use crate::results_grid::ExportFormat;
use crate::session::{CrudSession, Operation, OperationReport};
use std::io::{self, BufRead, Write};

/// Represents a parsed REPL command.
#[derive(Debug, PartialEq)]
pub enum Command {
    Tables,
    Use(String),
    Form,
    Create(Vec<(String, String)>),
    Read,
    Update(Vec<(String, String)>),
    Delete(Vec<(String, String)>),
    Export(String),
    Help,
    Quit,
    Sql(String),
    Unknown(String),
}

/// Parses a user input string into a corresponding `Command`.
///
/// If the input starts with a colon (`:`), it is interpreted as a command.
/// Otherwise, it is treated as an ad-hoc SQL statement.
pub fn parse_command(input: &str) -> Result<Command> {
    let input = input.trim();
    let Some(trimmed) = input.strip_prefix(':') else {
        return Ok(Command::Sql(input.to_string()));
    };
    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };

    let command = match name {
        "tables" => Command::Tables,
        "use" if !rest.is_empty() => Command::Use(rest.to_string()),
        "form" => Command::Form,
        "create" => Command::Create(parse_assignments(rest)?),
        "read" => Command::Read,
        "update" => Command::Update(parse_assignments(rest)?),
        "delete" => Command::Delete(parse_assignments(rest)?),
        "export" if !rest.is_empty() => Command::Export(rest.to_string()),
        "help" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    };
    Ok(command)
}

/// Splits `Column=value Other="two words"` into column/value pairs.
pub fn parse_assignments(input: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }
        if chars.next() != Some('=') || key.is_empty() {
            return Err(HrdeskError::Command(format!(
                "expected column=value, found '{}'",
                key
            )));
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => value.push(other),
                }
            }
            if !closed {
                return Err(HrdeskError::Command(format!(
                    "unterminated quote in value for {}",
                    key
                )));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }
        pairs.push((key, value));
    }

    Ok(pairs)
}

fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Available commands:")?;
    writeln!(out, "  :tables - List the tables of the HR schema")?;
    writeln!(out, "  :use <Table> - Select the table for form operations")?;
    writeln!(out, "  :form - Show the fields of the selected table")?;
    writeln!(out, "  :create Col=value ... - Insert a record")?;
    writeln!(out, "  :read - Show all records of the selected table")?;
    writeln!(out, "  :update Key=value Col=value ... - Update the record with that key")?;
    writeln!(out, "  :delete Key=value - Delete the record with that key")?;
    writeln!(out, "  :export <csv|json|markdown> - Export the displayed rows")?;
    writeln!(out, "  :quit - Leave")?;
    writeln!(out, "\nOr enter SQL statements directly without any prefix.")?;
    writeln!(out, "A statement may span several lines; it runs once a line ends with ';'.")
}

/// Prints the grid (for reads) followed by the outcome message.
pub fn print_report(
    out: &mut impl Write,
    session: &CrudSession<'_>,
    report: &OperationReport,
) -> io::Result<()> {
    if report.model.is_some() {
        write!(out, "{}", session.grid().render())?;
    }
    match report.affected_rows {
        Some(rows) => writeln!(out, "{} ({} row(s) affected)", report.message, rows),
        None => writeln!(out, "{}", report.message),
    }
}

/// Runs one command against the session, writing everything user-facing to `out`.
/// Returns `false` when the user asked to quit.
pub fn run_command(
    session: &mut CrudSession<'_>,
    command: Command,
    out: &mut impl Write,
) -> io::Result<bool> {
    let (operation, result) = match command {
        Command::Quit => return Ok(false),
        Command::Help => {
            print_help(out)?;
            return Ok(true);
        }
        Command::Tables => {
            for name in session.registry().table_names() {
                writeln!(out, "{}", name)?;
            }
            return Ok(true);
        }
        Command::Use(name) => {
            match session.select_table(&name) {
                Ok(table) => write!(out, "{}", render_form(table, None))?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
            return Ok(true);
        }
        Command::Form => {
            match session.selected_table() {
                Some(table) => write!(out, "{}", render_form(table, None))?,
                None => writeln!(out, "Error: {}", HrdeskError::EmptyInput)?,
            }
            return Ok(true);
        }
        Command::Export(format) => {
            let exported = format
                .parse::<ExportFormat>()
                .and_then(|format| session.grid().export(format));
            match exported {
                Ok(text) => write!(out, "{}", text)?,
                Err(e) => writeln!(out, "Error: {}", e)?,
            }
            return Ok(true);
        }
        Command::Unknown(input) => {
            writeln!(out, "Unknown command: {} (type :help)", input)?;
            return Ok(true);
        }
        Command::Create(pairs) => (Operation::Create, session.create(pairs)),
        Command::Read => (Operation::Read, session.read()),
        Command::Update(pairs) => (Operation::Update, session.update(pairs)),
        Command::Delete(pairs) => (Operation::Delete, session.delete(pairs)),
        Command::Sql(sql) => (Operation::AdHoc, session.execute_ad_hoc(&sql)),
    };

    match result {
        Ok(report) => print_report(out, session, &report)?,
        Err(e) => writeln!(out, "{}", operation.failure_message(&e))?,
    }
    Ok(true)
}

/// Runs the interactive shell until `:quit` or end of input.
///
/// SQL may span several lines; it runs once a line ends with `;`. Text still
/// pending at end of input runs as well.
pub fn run_repl(
    session: &mut CrudSession<'_>,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "Welcome to the hrdesk REPL! Type :help for commands, :quit to exit.")?;
    let mut lines = input.lines();
    let mut query_buffer = String::new();

    loop {
        write!(out, "{}", if query_buffer.is_empty() { "> " } else { "... " })?;
        out.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        if query_buffer.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            if line.trim_start().starts_with(':') {
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        writeln!(out, "Error: {}", e)?;
                        continue;
                    }
                };
                if !run_command(session, command, out)? {
                    return Ok(());
                }
                continue;
            }
        } else {
            query_buffer.push('\n');
        }

        query_buffer.push_str(&line);
        if query_buffer.trim_end().ends_with(';') {
            run_query(session, &mut query_buffer, out)?;
        }
    }

    if !query_buffer.trim().is_empty() {
        run_query(session, &mut query_buffer, out)?;
    }
    Ok(())
}

fn run_query(
    session: &mut CrudSession<'_>,
    query_buffer: &mut String,
    out: &mut impl Write,
) -> io::Result<()> {
    let query = std::mem::take(query_buffer);
    let query = query.trim();
    writeln!(out, "Executing query: {}", query)?;
    run_command(session, Command::Sql(query.to_string()), out)?;
    Ok(())
}
