use std::io::{self, BufRead, Write};

use common::ArtistCredit;

// a..s; t and u are fixed choices.
const MAX_LETTERED_SUGGESTIONS: usize = 19;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtistChoice {
    Literal,
    Suggestion(usize),
    Replacement(String),
}

// An Err means no answer can be obtained at all and ends the run.
pub trait DecisionChannel {
    fn choose_artist(&mut self, name: &str, suggestions: &[String]) -> io::Result<ArtistChoice>;

    fn confirm_split(&mut self, raw: &str, proposal: &ArtistCredit) -> io::Result<bool>;

    fn enter_primary(&mut self, raw: &str) -> io::Result<String>;

    fn enter_collaborator(&mut self, raw: &str, primary: &str) -> io::Result<Option<String>>;
}

impl<T: DecisionChannel + ?Sized> DecisionChannel for &mut T {
    fn choose_artist(&mut self, name: &str, suggestions: &[String]) -> io::Result<ArtistChoice> {
        (**self).choose_artist(name, suggestions)
    }

    fn confirm_split(&mut self, raw: &str, proposal: &ArtistCredit) -> io::Result<bool> {
        (**self).confirm_split(raw, proposal)
    }

    fn enter_primary(&mut self, raw: &str) -> io::Result<String> {
        (**self).enter_primary(raw)
    }

    fn enter_collaborator(&mut self, raw: &str, primary: &str) -> io::Result<Option<String>> {
        (**self).enter_collaborator(raw, primary)
    }
}

pub struct PromptChannel<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptChannel<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "decision input closed",
            ));
        }
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    fn ask_non_blank(&mut self, prompt: &str) -> io::Result<String> {
        loop {
            let answer = self.ask(prompt)?;
            let trimmed = answer.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
            writeln!(self.output, "A name cannot be empty.")?;
        }
    }
}

impl<R: BufRead, W: Write> DecisionChannel for PromptChannel<R, W> {
    fn choose_artist(&mut self, name: &str, suggestions: &[String]) -> io::Result<ArtistChoice> {
        let offered = suggestions.len().min(MAX_LETTERED_SUGGESTIONS);
        writeln!(self.output)?;
        writeln!(self.output, "Artist: {}", name)?;
        writeln!(self.output, "No artist with this exact name in the catalog.")?;
        writeln!(self.output, "    (u) Use {}", name)?;
        if offered > 0 {
            writeln!(self.output, "Suggestions from existing artists:")?;
            for (idx, suggestion) in suggestions.iter().take(offered).enumerate() {
                writeln!(self.output, "    ({}) Use {}", letter(idx), suggestion)?;
            }
        }
        writeln!(self.output, " or (t) Type the artist name")?;

        loop {
            let answer = self.ask("> ")?.trim().to_lowercase();
            match answer.as_str() {
                "u" => return Ok(ArtistChoice::Literal),
                "t" => {
                    let typed = self.ask_non_blank("Enter artist name: ")?;
                    return Ok(ArtistChoice::Replacement(typed));
                }
                other => {
                    if let Some(idx) = suggestion_index(other, offered) {
                        return Ok(ArtistChoice::Suggestion(idx));
                    }
                    writeln!(
                        self.output,
                        "Wrong choice, use one of the letters in brackets."
                    )?;
                }
            }
        }
    }

    fn confirm_split(&mut self, raw: &str, proposal: &ArtistCredit) -> io::Result<bool> {
        writeln!(self.output)?;
        writeln!(self.output, "Artist in album/track: {}", raw)?;
        writeln!(self.output, "Split suggestion")?;
        writeln!(self.output, "  Main artist:")?;
        writeln!(self.output, "    {}", proposal.primary)?;
        writeln!(self.output, "  Featuring artist(s):")?;
        for collaborator in &proposal.collaborators {
            writeln!(self.output, "    {}", collaborator)?;
        }
        writeln!(self.output, "Enter 'u' to use this split, 'm' to split manually")?;
        writeln!(self.output, "(typos in single names can be fixed next)")?;

        loop {
            let answer = self.ask("> ")?.trim().to_lowercase();
            match answer.as_str() {
                "u" => return Ok(true),
                "m" => return Ok(false),
                _ => writeln!(self.output, "Please answer 'u' or 'm'.")?,
            }
        }
    }

    fn enter_primary(&mut self, raw: &str) -> io::Result<String> {
        writeln!(self.output, "Splitting: {}", raw)?;
        self.ask_non_blank("Enter artist without featuring artists: ")
    }

    fn enter_collaborator(&mut self, _raw: &str, primary: &str) -> io::Result<Option<String>> {
        loop {
            let answer = self.ask(&format!(
                "Featuring artist with {} (or 'd' when done): ",
                primary
            ))?;
            let trimmed = answer.trim();
            if trimmed.eq_ignore_ascii_case("d") {
                return Ok(None);
            }
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }
}

fn letter(idx: usize) -> char {
    char::from(b'a' + idx as u8)
}

fn suggestion_index(answer: &str, offered: usize) -> Option<usize> {
    let mut chars = answer.chars();
    let ch = chars.next()?;
    if chars.next().is_some() || !ch.is_ascii_lowercase() {
        return None;
    }
    let idx = (ch as u8 - b'a') as usize;
    (idx < offered).then_some(idx)
}
