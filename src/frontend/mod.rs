use std::io::{self, Write};
use std::path::PathBuf;

use log::info;
use termion::color;

use crate::archiver::Archiver;
use crate::formatter::Formatter;
use crate::mailer::Mailer;

pub mod prompt;

/// The three inputs every front end has to supply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Job {
    pub source: PathBuf,
    pub format: String,
    pub destination: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    fn success(message: String) -> Outcome {
        Outcome {
            success: true,
            message,
        }
    }

    fn failure(message: String) -> Outcome {
        Outcome {
            success: false,
            message,
        }
    }

    pub fn print<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.success {
            writeln!(
                out,
                "{}{}{}",
                color::Fg(color::Green),
                self.message,
                color::Fg(color::Reset)
            )
        } else {
            writeln!(
                out,
                "{}{}{}",
                color::Fg(color::Red),
                self.message,
                color::Fg(color::Reset)
            )
        }
    }
}

/// Compresses the job's directory and mails the archive. Each step stops at
/// its first failure.
pub fn run(job: &Job, archiver: &Archiver, mailer: &Mailer) -> Outcome {
    if job.source.as_os_str().is_empty() {
        return Outcome::failure(String::from("Error: no directory selected."));
    }
    if job.destination.as_os_str().is_empty() {
        return Outcome::failure(String::from("Error: no destination directory selected."));
    }

    let archive = match archiver.compress(&job.source, &job.format, &job.destination) {
        Ok(archive) => archive,
        Err(err) => return Outcome::failure(format!("Error: {}", err)),
    };
    info!("compression completed: {}", archive.path.display());

    let directory = match archive.path.parent() {
        Some(directory) => directory.to_path_buf(),
        None => job.destination.clone(),
    };
    match mailer.send(
        &directory,
        &archive.base_name,
        archive.compression.extension(),
    ) {
        Ok(_) => Outcome::success(format!(
            "{} ({}) compressed and sent by email.",
            archive.file_name(),
            Formatter::format_size(archive.size, 2)
        )),
        Err(err) => Outcome::failure(format!(
            "Error: {} was created, but could not be mailed: {}",
            archive.file_name(),
            err
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{run, Job, Outcome};
    use crate::archiver::Archiver;
    use crate::configuration::{Credential, Security, SmtpSettings};
    use crate::mailer::Mailer;

    fn mailer(port: u16) -> Mailer {
        Mailer::new(SmtpSettings {
            server: String::from("127.0.0.1"),
            port,
            credential: Credential::new("me@example.com", "secret"),
            security: Security::None,
            timeout: Duration::from_secs(5),
        })
    }

    fn silent_listener() -> TcpListener {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        listener
    }

    #[test]
    fn empty_source_is_reported_without_work() {
        let listener = silent_listener();
        let job = Job {
            source: PathBuf::new(),
            format: String::from("ZIP"),
            destination: PathBuf::from("/tmp"),
        };

        let outcome = run(&job, &Archiver::new(), &mailer(listener.local_addr().unwrap().port()));

        assert_eq!(
            outcome,
            Outcome {
                success: false,
                message: String::from("Error: no directory selected."),
            }
        );
        assert!(listener.accept().is_err());
    }

    #[test]
    fn invalid_format_stops_before_mailing() {
        let listener = silent_listener();
        let workspace = tempfile::tempdir().unwrap();
        let source = workspace.path().join("reports");
        fs::create_dir(&source).unwrap();
        let job = Job {
            source,
            format: String::from("RAR"),
            destination: workspace.path().join("out"),
        };

        let outcome = run(&job, &Archiver::new(), &mailer(listener.local_addr().unwrap().port()));

        assert!(!outcome.success);
        assert!(outcome.message.contains("invalid compression format"));
        assert!(listener.accept().is_err());
        assert!(!workspace.path().join("out").exists());
    }

    #[test]
    fn mail_failure_keeps_the_archive_and_says_so() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let workspace = tempfile::tempdir().unwrap();
        let source = workspace.path().join("reports");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a.txt"), b"0123456789").unwrap();
        let job = Job {
            source,
            format: String::from("TAR"),
            destination: workspace.path().join("out"),
        };

        let outcome = run(&job, &Archiver::new(), &mailer(port));

        assert!(!outcome.success);
        assert!(outcome.message.contains("reports.tar was created"));
        assert!(outcome.message.contains("connection failed"));
        assert!(workspace.path().join("out/reports.tar").is_file());
    }

    #[test]
    fn print_colors_by_result() {
        let mut out = Vec::new();
        Outcome {
            success: false,
            message: String::from("boom"),
        }
        .print(&mut out)
        .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("boom"));
        assert!(printed.starts_with(&format!("{}", termion::color::Fg(termion::color::Red))));
    }

    #[test]
    fn failure_message_is_written_once() {
        let outcome = run(&Job::default(), &Archiver::new(), &mailer(25));
        let mut out = Vec::new();
        outcome.print(&mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches("no directory selected").count(), 1);
        assert_eq!(printed.lines().count(), 1);
    }
}
