use std::io::{Write, stdout};
use std::path::Path;

use anyhow::Result;
use colorful::{Colorful, RGB};
use crossterm::{
    ExecutableCommand, cursor,
    event::{Event, KeyCode, KeyEventKind, read},
    terminal::{self, Clear, ClearType},
};

use crate::models::ChatRecord;
use crate::storage;

/// Selection and row bookkeeping for a list view, kept apart from the
/// terminal so the mutations can be tested directly.
pub struct ViewerState {
    chats: Vec<ChatRecord>,
    selected: usize,
}

impl ViewerState {
    pub fn new(chats: Vec<ChatRecord>) -> Self {
        Self { chats, selected: 0 }
    }

    pub fn chats(&self) -> &[ChatRecord] {
        &self.chats
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.chats.len() {
            self.selected += 1;
        }
    }

    /// Removes the selected row and returns it, clamping the selection to
    /// the new last row when the tail was removed.
    pub fn remove_selected(&mut self) -> Option<ChatRecord> {
        if self.chats.is_empty() {
            return None;
        }
        let removed = self.chats.remove(self.selected);
        if self.selected >= self.chats.len() && self.selected > 0 {
            self.selected -= 1;
        }
        Some(removed)
    }
}

/// Review a collected chat list: j/k or arrows to move, `d` deletes the
/// row from the list, `K` keeps the chat forever, `q` quits.
pub fn review_chats(file: &Path, keep_file: &Path) -> Result<()> {
    let chats = storage::load_chat_list(file)?;
    if chats.is_empty() {
        println!("No chats found in the file.");
        return Ok(());
    }

    let mut state = ViewerState::new(chats);
    let mut notice = String::new();

    run_raw(|| {
        loop {
            draw(&state, "Inactive chats", "j/k move  d remove  K keep  q quit", &notice)?;
            let Event::Key(key) = read()? else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Up | KeyCode::Char('k') => state.move_up(),
                KeyCode::Down | KeyCode::Char('j') => state.move_down(),
                KeyCode::Char('d') => {
                    if let Some(removed) = state.remove_selected() {
                        storage::save_chat_list(file, state.chats())?;
                        notice = format!("Removed: {}", removed.name);
                    }
                }
                KeyCode::Char('K') => {
                    if let Some(kept) = state.remove_selected() {
                        storage::add_to_keep_list(keep_file, &kept)?;
                        storage::save_chat_list(file, state.chats())?;
                        notice = format!("Kept: {}", kept.name);
                    }
                }
                _ => {}
            }
            if state.is_empty() {
                break;
            }
        }
        Ok(())
    })
}

/// Review the keep list itself: `d` un-keeps the selected chat.
pub fn review_keep_list(keep_file: &Path) -> Result<()> {
    let chats = storage::load_keep_records(keep_file);
    if chats.is_empty() {
        println!("The keep list is empty.");
        return Ok(());
    }

    let mut state = ViewerState::new(chats);
    let mut notice = String::new();

    run_raw(|| {
        loop {
            draw(&state, "Kept chats", "j/k move  d un-keep  q quit", &notice)?;
            let Event::Key(key) = read()? else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Up | KeyCode::Char('k') => state.move_up(),
                KeyCode::Down | KeyCode::Char('j') => state.move_down(),
                KeyCode::Char('d') => {
                    if let Some(removed) = state.remove_selected() {
                        storage::remove_from_keep_list(keep_file, removed.id)?;
                        notice = format!("Un-kept: {}", removed.name);
                    }
                }
                _ => {}
            }
            if state.is_empty() {
                break;
            }
        }
        Ok(())
    })
}

fn run_raw(body: impl FnOnce() -> Result<()>) -> Result<()> {
    terminal::enable_raw_mode()?;
    stdout().execute(Clear(ClearType::All))?;
    let result = body();
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn draw(state: &ViewerState, title: &str, hints: &str, notice: &str) -> Result<()> {
    let primary = RGB::new(79, 70, 229);
    let subtle = RGB::new(107, 114, 128);
    let success = RGB::new(16, 185, 129);

    let mut out = stdout();
    out.execute(cursor::MoveTo(0, 0))?;
    out.execute(Clear(ClearType::FromCursorDown))?;

    write!(
        out,
        "  {} ({} chats)\r\n  {}\r\n\r\n",
        title.to_string().color(primary),
        state.chats().len(),
        hints.to_string().color(subtle),
    )?;
    write!(
        out,
        "    {:<32} {:<10} {:<10} {:>6}\r\n",
        "Name", "Type", "Last Msg", "Unread"
    )?;

    for (index, chat) in state.chats().iter().enumerate() {
        let marker = if index == state.selected_index() {
            "  ➤ "
        } else {
            "    "
        };
        let name: String = chat.name.chars().take(32).collect();
        let date: String = chat
            .last_message_date
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(10)
            .collect();
        let row = format!(
            "{marker}{:<32} {:<10} {:<10} {:>6}",
            name, chat.kind, date, chat.unread_count
        );
        if index == state.selected_index() {
            write!(out, "{}\r\n", row.color(success))?;
        } else {
            write!(out, "{row}\r\n")?;
        }
    }

    if !notice.is_empty() {
        write!(out, "\r\n  {}\r\n", notice.to_string().color(subtle))?;
    }
    out.flush()?;
    Ok(())
}
