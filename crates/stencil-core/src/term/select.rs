//! Single-selection menu: navigate with arrows, commit with Enter, cancel
//! with Escape

use super::input::{KeySource, Subscription};
use super::key::{KeyEvent, KeyName};
use super::surface::Surface;
use anyhow::Result;
use colored::Colorize;
use std::io::{Stdout, Write};

/// One selectable entry, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub key: String,
    pub label: String,
}

impl SelectItem {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Selector lifecycle. `Resolved` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Resolved,
    Cancelled,
}

/// Single-selection menu state machine. Lives for exactly one prompt:
/// constructed, `run()`, gone.
pub struct Selector<'k, W: Write> {
    keys: &'k KeySource,
    surface: Surface<W>,
    title: String,
    items: Vec<SelectItem>,
    selected: usize,
    phase: Phase,
}

impl<'k> Selector<'k, Stdout> {
    pub fn new(keys: &'k KeySource, title: impl Into<String>, items: Vec<SelectItem>) -> Self {
        Self::with_surface(keys, title, items, Surface::stdout())
    }
}

impl<'k, W: Write> Selector<'k, W> {
    pub fn with_surface(
        keys: &'k KeySource,
        title: impl Into<String>,
        items: Vec<SelectItem>,
        surface: Surface<W>,
    ) -> Self {
        Self {
            keys,
            surface,
            title: title.into(),
            items,
            selected: 0,
            phase: Phase::Idle,
        }
    }

    /// Present the menu and suspend until the user commits or cancels.
    ///
    /// Returns the chosen item, or `None` on cancellation. Raw mode is held
    /// for the duration of the prompt and released on every exit path; the
    /// rendered block is erased before returning. With an empty item list
    /// the prompt is cancel-only: Enter is ignored, Escape yields `None`.
    pub async fn run(mut self) -> Result<Option<SelectItem>> {
        let _guard = self.keys.raw_guard()?;
        let mut events = self.keys.on_any();
        self.phase = Phase::Active;

        let outcome = self.drive(&mut events).await;

        // Cleanup runs whether or not the drive loop failed.
        let _ = self.surface.erase_last();
        let _ = self.surface.show_cursor();
        outcome
    }

    async fn drive(&mut self, events: &mut Subscription) -> Result<Option<SelectItem>> {
        self.surface.hide_cursor()?;
        let frame = self.frame();
        self.surface.draw(&frame)?;

        while self.phase == Phase::Active {
            match events.recv().await {
                Some(event) => {
                    self.apply(&event);
                    if self.phase == Phase::Active {
                        let frame = self.frame();
                        self.surface.draw(&frame)?;
                    }
                }
                // Key source went away; treat as cancellation.
                None => self.phase = Phase::Cancelled,
            }
        }

        Ok(if self.phase == Phase::Resolved {
            self.items.get(self.selected).cloned()
        } else {
            None
        })
    }

    /// Apply one key event to the state machine. Pure state transition:
    /// unmatched keys are ignored, terminal phases absorb everything.
    fn apply(&mut self, event: &KeyEvent) {
        if self.phase != Phase::Active {
            return;
        }
        let count = self.items.len();
        match event.name {
            KeyName::Up if count > 0 => self.selected = (self.selected + count - 1) % count,
            KeyName::Down if count > 0 => self.selected = (self.selected + 1) % count,
            KeyName::Enter if count > 0 => self.phase = Phase::Resolved,
            KeyName::Escape => self.phase = Phase::Cancelled,
            _ => {}
        }
    }

    /// Render the bordered block: title in the top border, one line per
    /// item, the selected one highlighted.
    fn frame(&self) -> String {
        let max_width = self.surface.width().max(24) as usize;
        let title_len = self.title.chars().count();
        let inner = self
            .items
            .iter()
            .map(|item| item.label.chars().count() + 2)
            .chain([title_len + 2])
            .max()
            .unwrap_or(title_len + 2)
            .min(max_width.saturating_sub(4));

        let mut out = String::new();
        let title = truncate(&self.title, inner);
        let top_fill = "─".repeat(inner.saturating_sub(title.chars().count()));
        out.push_str(&format!(
            "{} {} {}{}\n",
            "┌".dimmed(),
            title.as_str().bold(),
            top_fill.as_str().dimmed(),
            "┐".dimmed()
        ));

        if self.items.is_empty() {
            let row = pad("(no options)", inner);
            out.push_str(&format!(
                "{} {} {}\n",
                "│".dimmed(),
                row.as_str().dimmed(),
                "│".dimmed()
            ));
        }

        for (idx, item) in self.items.iter().enumerate() {
            let label = pad(&truncate(&item.label, inner.saturating_sub(2)), inner - 2);
            let row = if idx == self.selected {
                format!("{} {}", "❯".cyan(), label.as_str().cyan().bold())
            } else {
                format!("  {label}")
            };
            out.push_str(&format!("{} {} {}\n", "│".dimmed(), row, "│".dimmed()));
        }

        out.push_str(&format!(
            "{}{}{}\n",
            "└".dimmed(),
            "─".repeat(inner + 2).as_str().dimmed(),
            "┘".dimmed()
        ));
        out
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::input::{RawKey, DEBOUNCE_WINDOW};
    use crossterm::event::KeyCode;
    use std::time::Duration;

    fn items_abc() -> Vec<SelectItem> {
        vec![
            SelectItem::new("a", "Option A"),
            SelectItem::new("b", "Option B"),
            SelectItem::new("c", "Option C"),
        ]
    }

    fn press(name: KeyName) -> KeyEvent {
        KeyEvent {
            raw: None,
            name,
            ctrl: false,
        }
    }

    /// Inject keys spaced apart so each survives the debounce window.
    async fn type_keys(keys: &KeySource, codes: &[KeyCode]) {
        // Let run() subscribe before the first key lands.
        tokio::time::sleep(Duration::from_millis(20)).await;
        for code in codes {
            keys.inject(RawKey::plain(*code));
            tokio::time::sleep(DEBOUNCE_WINDOW + Duration::from_millis(40)).await;
        }
    }

    #[tokio::test]
    async fn test_wrap_around_matches_modular_arithmetic() {
        let keys = KeySource::detached();
        let mut selector =
            Selector::with_surface(&keys, "Pick", items_abc(), Surface::new(Vec::<u8>::new(), || None));
        selector.phase = Phase::Active;

        let downs = 5;
        let ups = 2;
        for _ in 0..downs {
            selector.apply(&press(KeyName::Down));
        }
        for _ in 0..ups {
            selector.apply(&press(KeyName::Up));
        }
        assert_eq!(selector.selected, (downs - ups) % 3);
    }

    #[tokio::test]
    async fn test_up_from_first_wraps_to_last() {
        let keys = KeySource::detached();
        let mut selector =
            Selector::with_surface(&keys, "Pick", items_abc(), Surface::new(Vec::<u8>::new(), || None));
        selector.phase = Phase::Active;

        selector.apply(&press(KeyName::Up));
        assert_eq!(selector.selected, 2);
        selector.apply(&press(KeyName::Escape));
        assert_eq!(selector.phase, Phase::Cancelled);
    }

    #[tokio::test]
    async fn test_terminal_phases_absorb_input() {
        let keys = KeySource::detached();
        let mut selector =
            Selector::with_surface(&keys, "Pick", items_abc(), Surface::new(Vec::<u8>::new(), || None));
        selector.phase = Phase::Active;

        selector.apply(&press(KeyName::Enter));
        assert_eq!(selector.phase, Phase::Resolved);
        selector.apply(&press(KeyName::Escape));
        assert_eq!(selector.phase, Phase::Resolved);
    }

    #[tokio::test]
    async fn test_unrelated_keys_are_ignored() {
        let keys = KeySource::detached();
        let mut selector =
            Selector::with_surface(&keys, "Pick", items_abc(), Surface::new(Vec::<u8>::new(), || None));
        selector.phase = Phase::Active;

        selector.apply(&press(KeyName::Char('q')));
        selector.apply(&press(KeyName::Tab));
        assert_eq!(selector.selected, 0);
        assert_eq!(selector.phase, Phase::Active);
    }

    #[tokio::test]
    async fn test_down_down_enter_resolves_third_item() {
        let keys = KeySource::detached();
        let selector =
            Selector::with_surface(&keys, "Pick", items_abc(), Surface::new(Vec::<u8>::new(), || None));

        let (result, ()) = tokio::join!(
            selector.run(),
            type_keys(&keys, &[KeyCode::Down, KeyCode::Down, KeyCode::Enter])
        );
        let chosen = result.unwrap().expect("should resolve");
        assert_eq!(chosen.key, "c");
    }

    #[tokio::test]
    async fn test_up_escape_cancels_without_result() {
        let keys = KeySource::detached();
        let selector =
            Selector::with_surface(&keys, "Pick", items_abc(), Surface::new(Vec::<u8>::new(), || None));

        let (result, ()) = tokio::join!(
            selector.run(),
            type_keys(&keys, &[KeyCode::Up, KeyCode::Esc])
        );
        assert!(result.unwrap().is_none());
        assert!(!keys.raw_mode_active());
    }

    #[tokio::test]
    async fn test_empty_items_is_cancel_only() {
        let keys = KeySource::detached();
        let selector =
            Selector::with_surface(&keys, "Pick", Vec::new(), Surface::new(Vec::<u8>::new(), || None));

        let (result, ()) = tokio::join!(
            selector.run(),
            type_keys(&keys, &[KeyCode::Enter, KeyCode::Esc])
        );
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_frame_highlights_selected_item() {
        let keys = KeySource::detached();
        let mut selector =
            Selector::with_surface(&keys, "Pick", items_abc(), Surface::new(Vec::<u8>::new(), || None));
        selector.phase = Phase::Active;
        selector.apply(&press(KeyName::Down));

        let frame = selector.frame();
        assert!(frame.contains("Option B"));
        assert!(frame.contains('❯'));
        assert!(frame.contains('┌'));
        assert!(frame.contains('└'));
    }
}
