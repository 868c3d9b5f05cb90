//! Interactive prompting, kept behind a trait so workflows can run on scripted answers.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of answers to yes/no, name and conflict questions.
pub trait Prompter {
    /// Show `question` and return the trimmed answer. End of input is an empty answer.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// `[y/N]` confirmation; only `y`/`yes` (any case) confirm.
pub fn confirm(prompter: &mut dyn Prompter, question: &str) -> Result<bool> {
    let answer = prompter.ask(&format!("{question} [y/N]: "))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Reads answers from stdin, writing questions to stdout.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        let mut out = io::stdout().lock();
        write!(out, "{question}").context("write prompt")?;
        out.flush().context("flush prompt")?;
        drop(out);

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).context("read answer")?;
        Ok(line.trim().to_string())
    }
}

/// Replays canned answers and records every question asked.
/// Running out of answers behaves like end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.asked.push(question.to_string());
        Ok(self
            .answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .unwrap_or_default())
    }
}
