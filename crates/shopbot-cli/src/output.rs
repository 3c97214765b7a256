use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use std::io::{self, Write};

pub const ASSISTANT_COLOR: Color = Color::Yellow;
pub const PROMPT_COLOR: Color = Color::DarkBlue;
pub const DEBUG_COLOR: Color = Color::DarkGrey;
pub const NOTICE_COLOR: Color = Color::Green;
pub const ERROR_COLOR: Color = Color::DarkRed;

pub fn print_colored(text: &str, color: Color) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout
        .execute(SetForegroundColor(color))?
        .execute(Print(text))?
        .execute(ResetColor)?;
    writeln!(stdout)
}

pub fn print_assistant(name: &str, text: &str) -> io::Result<()> {
    println!();
    print_colored(&format!("{}: {}", name, text), ASSISTANT_COLOR)?;
    println!();
    Ok(())
}

/// Read one line after a coloured prompt. `None` at end of input.
pub fn read_input(prompt: &str) -> io::Result<Option<String>> {
    let mut stdout = io::stdout();
    stdout
        .execute(SetForegroundColor(PROMPT_COLOR))?
        .execute(Print(prompt))?
        .execute(ResetColor)?;
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Read a line, using `default` when the answer is blank.
pub fn read_with_default(prompt: &str, default: &str) -> io::Result<Option<String>> {
    let answer = read_input(&format!("{} [{}]: ", prompt, default))?;
    Ok(answer.map(|a| if a.is_empty() { default.to_string() } else { a }))
}

pub fn read_yes_or_no(prompt: &str) -> io::Result<bool> {
    let answer = read_input(&format!("{} (y/n) ", prompt))?.unwrap_or_default();
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}
