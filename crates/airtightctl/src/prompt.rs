//! Yes/no confirmation

use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

/// Ask `question` until the answer is yes or no. Empty input and EOF are no.
pub fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<bool> {
    loop {
        write!(output, "\n[?] {} {} ", question, "[y/N]:".bright_magenta())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "" | "n" | "no" => return Ok(false),
            _ => writeln!(output, "    Please answer 'y' or 'n'")?,
        }
    }
}

/// [`confirm_with`] on the terminal
pub fn confirm(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    confirm_with(&mut stdin.lock(), &mut io::stdout(), question)
}
