//! Styled console output and small key-driven prompts

use crate::term::input::KeySource;
use crate::term::key::KeyName;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

pub fn intro(title: &str) {
    println!();
    println!("{} {}", "◆".cyan(), title.bold());
    println!();
}

pub fn outro(message: &str) {
    println!();
    println!("{} {}", "◆".cyan(), message);
    println!();
}

pub fn info(message: impl AsRef<str>) {
    println!("{} {}", "●".blue(), message.as_ref());
}

pub fn success(message: impl AsRef<str>) {
    println!("{} {}", "✔".green(), message.as_ref());
}

pub fn warning(message: impl AsRef<str>) {
    println!("{} {}", "▲".yellow(), message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    println!("{} {}", "✖".red(), message.as_ref());
}

/// Line-buffered text prompt. Runs outside raw mode on purpose: the
/// terminal's own line editing is all we need here.
pub fn input_line(prompt: &str, default: &str) -> Result<String> {
    print!(
        "{} {} {} ",
        "?".cyan(),
        prompt,
        format!("({})", default).as_str().dimmed()
    );
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let trimmed = line.trim();
    Ok(if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    })
}

/// Key-driven yes/no question. Enter or `y` confirms, Escape or `n`
/// declines; everything else is ignored. Raw mode is scoped to the prompt.
pub async fn confirm(keys: &KeySource, question: &str) -> Result<bool> {
    println!(
        "{} {} {}",
        "?".cyan(),
        question,
        "[Enter = yes / Esc = no]".dimmed()
    );

    let _guard = keys.raw_guard()?;
    let mut events = keys.on_any();
    let answer = loop {
        match events.recv().await {
            Some(event) => match event.name {
                KeyName::Enter | KeyName::Char('y') | KeyName::Char('Y') => break true,
                KeyName::Escape | KeyName::Char('n') | KeyName::Char('N') => break false,
                _ => {}
            },
            None => break false,
        }
    };
    Ok(answer)
}

/// Block until the user presses any key.
pub async fn press_any_key(keys: &KeySource, prompt: &str) -> Result<()> {
    println!("{}", prompt.dimmed());
    let _guard = keys.raw_guard()?;
    let _ = keys.wait_for_key().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::input::RawKey;
    use crossterm::event::KeyCode;
    use std::time::Duration;

    #[tokio::test]
    async fn test_confirm_accepts_enter_and_rejects_escape() {
        let keys = KeySource::detached();

        let (answer, ()) = tokio::join!(confirm(&keys, "Proceed?"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            keys.inject(RawKey::plain(KeyCode::Enter));
        });
        assert!(answer.unwrap());

        let (answer, ()) = tokio::join!(confirm(&keys, "Proceed?"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            keys.inject(RawKey::plain(KeyCode::Esc));
        });
        assert!(!answer.unwrap());
    }

    #[tokio::test]
    async fn test_confirm_ignores_unrelated_keys() {
        let keys = KeySource::detached();

        let (answer, ()) = tokio::join!(confirm(&keys, "Proceed?"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            keys.inject(RawKey::plain(KeyCode::Char('x')));
            tokio::time::sleep(Duration::from_millis(100)).await;
            keys.inject(RawKey::plain(KeyCode::Char('n')));
        });
        assert!(!answer.unwrap());
    }
}
