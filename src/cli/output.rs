//! Colored output helpers for the ragdesk CLI.

use crate::types::{ConversationTurn, MessageRole, SearchResult, Source};
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

/// Maximum characters of passage text shown per search hit.
const PREVIEW_CHARS: usize = 160;

/// Terminal printer. Falls back to bracketed tags when color is off.
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}",
                "ragdesk".bright_cyan().bold(),
                version.dimmed()
            );
            println!("   {}\n", "Answers grounded in your documents".bright_white());
        } else {
            println!("\n   ragdesk {}", version);
            println!("   Answers grounded in your documents\n");
        }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Progress line for multi-step operations such as ingestion.
    pub fn step(&self, step_num: u32, total: u32, message: &str) {
        let counter = format!("[{}/{}]", step_num, total);
        if self.colored {
            println!("  {} {}", counter.dimmed(), message.bright_white());
        } else {
            println!("  {} {}", counter, message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// An assistant answer, indented as a block.
    pub fn answer(&self, text: &str) {
        let body = if text.is_empty() { "(no answer)" } else { text };
        if self.colored {
            println!("\n  {}", "assistant".bright_green().bold());
        } else {
            println!("\n  [ASSISTANT]");
        }
        for line in body.lines() {
            println!("    {}", line);
        }
    }

    pub fn sources(&self, sources: &[Source]) {
        if sources.is_empty() {
            return;
        }
        if self.colored {
            println!("\n    {}", "sources".dimmed());
        } else {
            println!("\n    Sources:");
        }
        for source in sources {
            let location = source.url.as_deref().unwrap_or("-");
            let line = format!("{} ({:.3}) {}", source.title, source.relevance_score, location);
            if self.colored {
                println!("      {}", line.dimmed());
            } else {
                println!("      {}", line);
            }
        }
    }

    /// One ranked search hit with a text preview.
    pub fn search_hit(&self, result: &SearchResult) {
        let preview = preview(&result.text);
        if self.colored {
            println!(
                "  {} {} {}",
                format!("#{}", result.rank).bright_cyan().bold(),
                result.title().bright_white().bold(),
                format!("{:.3}", result.similarity_score).dimmed()
            );
            if let Some(url) = result.url() {
                println!("     {}", url.blue().underline());
            }
            println!("     {}", preview.dimmed());
        } else {
            println!(
                "  #{} {} ({:.3})",
                result.rank,
                result.title(),
                result.similarity_score
            );
            if let Some(url) = result.url() {
                println!("     {}", url);
            }
            println!("     {}", preview);
        }
    }

    pub fn turn(&self, turn: &ConversationTurn) {
        let stamp = turn.timestamp.format("%H:%M:%S").to_string();
        let role = turn.role.as_str();
        if self.colored {
            let role = match turn.role {
                MessageRole::User => role.bright_cyan().to_string(),
                _ => role.bright_green().to_string(),
            };
            println!("  {} {} {}", stamp.dimmed(), role, turn.content);
        } else {
            println!("  {} [{}] {}", stamp, role, turn.content);
        }
    }

    /// Read one line after printing `label`. `None` on end of input.
    pub fn prompt(&self, label: &str) -> Option<String> {
        if self.colored {
            print!("\n  {} ", format!("{}>", label).bright_cyan().bold());
        } else {
            print!("\n  {}> ", label);
        }
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim().to_string()),
        }
    }

    /// Ask a yes/no question; anything but `y`/`yes` is a no.
    pub fn confirm(&self, message: &str) -> bool {
        if self.colored {
            print!("  {} {} [y/N]: ", "?".bright_yellow().bold(), message.bright_white());
        } else {
            print!("  [?] {} [y/N]: ", message);
        }
        io::stdout().flush().ok();

        let mut input = String::new();
        io::stdin().read_line(&mut input).is_ok() && is_yes(&input)
    }

    pub fn newline(&self) {
        println!();
    }
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut.trim_end())
    }
}
