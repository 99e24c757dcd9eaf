use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::configuration::Compression;
use crate::frontend::Job;

/// Question-and-answer front end over any line based input.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Prompt<R, W> {
        Prompt { input, output }
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}: ", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }

    /// Asks for the directory, the format and the destination. Stops after
    /// the first question when no directory is given.
    pub fn collect(&mut self) -> io::Result<Job> {
        writeln!(self.output, "Starting compression and mail process...")?;

        let source = self.ask("Directory to compress")?;
        if source.is_empty() {
            return Ok(Job::default());
        }
        writeln!(self.output, "Selected directory: {}", source)?;

        writeln!(self.output, "Available formats: {}", Compression::labels())?;
        let format = self.ask("Compression format")?.to_uppercase();
        let destination = self.ask("Destination directory for the archive")?;

        Ok(Job {
            source: PathBuf::from(source),
            format,
            destination: PathBuf::from(destination),
        })
    }
}
