//! Interactive tag selection.

use std::io::{BufRead, IsTerminal, Write};

use async_trait::async_trait;
use ea_lifecycle::{LifecycleError, LifecycleResult, TagSelector};

/// Lists the newest tags and asks which one to use.
///
/// Falls back to the newest tag when `assume_default` is set or stdin is
/// not a terminal.
#[derive(Debug, Clone, Copy)]
pub struct PromptSelector {
    pub limit: usize,
    pub assume_default: bool,
}

/// Parse a selection against `count` choices. Blank input picks 0.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0);
    }
    let index: usize = input
        .parse()
        .map_err(|_| "Invalid input. Please enter a number.".to_string())?;
    if index < count {
        Ok(index)
    } else {
        Err(format!(
            "Invalid selection. Please enter a number between 0 and {}.",
            count.saturating_sub(1)
        ))
    }
}

/// Print the numbered `tags` and read a choice. `None` when stdin closes.
fn ask(adapter: &str, tags: &[String]) -> std::io::Result<Option<usize>> {
    let stdout = std::io::stdout();
    let stdin = std::io::stdin();
    let mut out = stdout.lock();

    writeln!(out, "Available tags for {adapter}:")?;
    for (i, tag) in tags.iter().enumerate() {
        writeln!(out, "{i}) {tag}")?;
    }

    let mut input = stdin.lock();
    loop {
        write!(out, "Select a tag (0-{}) [0]: ", tags.len() - 1)?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match parse_selection(&line, tags.len()) {
            Ok(index) => return Ok(Some(index)),
            Err(message) => writeln!(out, "{message}")?,
        }
    }
}

#[async_trait]
impl TagSelector for PromptSelector {
    async fn select(&self, adapter: &str, tags: &[String]) -> LifecycleResult<String> {
        let shown = tags[..tags.len().min(self.limit.max(1))].to_vec();
        let Some(newest) = shown.first().cloned() else {
            return Err(LifecycleError::NoTags(adapter.to_string()));
        };
        if self.assume_default || !std::io::stdin().is_terminal() {
            return Ok(newest);
        }

        let selection_failed = |reason: String| LifecycleError::Selection {
            adapter: adapter.to_string(),
            reason,
        };
        let name = adapter.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            ask(&name, &shown).map(|index| index.map(|i| shown[i].clone()))
        })
        .await
        .map_err(|e| selection_failed(e.to_string()))?;

        match answer {
            Ok(Some(tag)) => Ok(tag),
            Ok(None) => Err(selection_failed(
                "input closed before a tag was chosen".to_string(),
            )),
            Err(e) => Err(selection_failed(e.to_string())),
        }
    }
}
