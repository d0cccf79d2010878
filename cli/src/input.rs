//! Where the customer request comes from.
use std::io::{self, Read};

use dialoguer::Input;

pub const NO_INPUT_MESSAGE: &str =
    "No website description provided. Use -r/--customer-request or pipe via stdin.";

/// Terminal interactions needed to obtain the request.
pub trait Console {
    fn stdin_is_terminal(&self) -> bool;
    fn stderr_is_terminal(&self) -> bool;
    fn read_stdin(&mut self) -> io::Result<String>;
    fn prompt(&mut self) -> io::Result<String>;
}

pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn stdin_is_terminal(&self) -> bool {
        atty::is(atty::Stream::Stdin)
    }

    fn stderr_is_terminal(&self) -> bool {
        atty::is(atty::Stream::Stderr)
    }

    fn read_stdin(&mut self) -> io::Result<String> {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Ok(content)
    }

    fn prompt(&mut self) -> io::Result<String> {
        eprintln!("🛠  Website Builder");
        eprintln!("Describe the website you want (features, purpose, audience, etc.).");
        eprintln!("Press Enter when you're done:\n");
        Input::<String>::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Flag, then piped stdin, then an interactive prompt unless `no_prompt`.
/// `None` means no usable request was given.
pub fn resolve_request(
    flag: Option<&str>,
    no_prompt: bool,
    console: &mut dyn Console,
) -> io::Result<Option<String>> {
    if let Some(text) = flag.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(Some(text.to_string()));
    }

    if !console.stdin_is_terminal() {
        let piped = console.read_stdin()?.replace("\r\n", "\n");
        let piped = piped.trim();
        if !piped.is_empty() {
            return Ok(Some(piped.to_string()));
        }
    }

    if no_prompt {
        return Ok(None);
    }

    // A closed or non-interactive terminal counts as no input.
    let answer = console.prompt().unwrap_or_default();
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}
