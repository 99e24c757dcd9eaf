use std::fs;
use std::path::Path;

use lettre::message::{
    header::{ContentTransferEncoding, ContentType},
    Attachment, Body, Mailbox, Message, MultiPart,
};
use lettre::transport::smtp::{
    authentication::{Credentials, Mechanism},
    client::{SmtpConnection, TlsParameters},
    extension::ClientId,
};
use log::{debug, info, warn};

use crate::configuration::{Credential, Security, SmtpSettings};
use crate::error::Error;
use crate::formatter::Formatter;

/// One SMTP conversation. Dropping it always ends the session: `QUIT` is
/// sent if the connection was not closed yet, and the socket is shut down if
/// that fails.
struct Session {
    connection: SmtpConnection,
    open: bool,
}

impl Session {
    fn open(settings: &SmtpSettings) -> Result<Session, Error> {
        let hello = ClientId::default();
        let tls_parameters = match settings.security {
            Security::None => None,
            Security::StartTls | Security::Tls => Some(
                TlsParameters::new(settings.server.clone())
                    .map_err(|err| Error::ConnectionFailed(format!("{}", err)))?,
            ),
        };
        let wrapper = match settings.security {
            Security::Tls => tls_parameters.as_ref(),
            _ => None,
        };

        debug!(
            "connecting to {}:{} ({:?})",
            settings.server, settings.port, settings.security
        );
        let connection = SmtpConnection::connect(
            (settings.server.as_str(), settings.port),
            Some(settings.timeout),
            &hello,
            wrapper,
            None,
        )
        .map_err(|err| {
            Error::ConnectionFailed(format!(
                "{}:{} => {}",
                settings.server, settings.port, err
            ))
        })?;
        let mut session = Session {
            connection,
            open: true,
        };

        if let (Security::StartTls, Some(tls_parameters)) =
            (settings.security, tls_parameters.as_ref())
        {
            if !session.connection.can_starttls() {
                return Err(Error::ConnectionFailed(format!(
                    "{} does not offer STARTTLS",
                    settings.server
                )));
            }
            session
                .connection
                .starttls(tls_parameters, &hello)
                .map_err(|err| Error::ConnectionFailed(format!("STARTTLS: {}", err)))?;
            debug!("connection upgraded with STARTTLS");
        }

        Ok(session)
    }

    fn authenticate(&mut self, credential: &Credential) -> Result<(), Error> {
        let credentials = Credentials::new(credential.username.clone(), credential.password.clone());
        self.connection
            .auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .map_err(|err| Error::AuthenticationFailed(format!("{}", err)))?;
        debug!("authenticated as {}", credential.username);
        Ok(())
    }

    fn send(&mut self, message: &Message) -> Result<(), Error> {
        self.connection
            .send(message.envelope(), &message.formatted())
            .map_err(|err| Error::SendFailed(format!("{}", err)))?;
        Ok(())
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(err) = self.connection.quit() {
            debug!("QUIT failed, aborting connection: {}", err);
            self.connection.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sends a single file to the configured account, from that same account.
pub struct Mailer {
    settings: SmtpSettings,
}

impl Mailer {
    pub fn new(settings: SmtpSettings) -> Mailer {
        Mailer { settings }
    }

    /// Mails `directory/base_filename.extension`. The file is read before any
    /// connection is made and is never modified or removed.
    pub fn send<P: AsRef<Path>>(
        &self,
        directory: P,
        base_filename: &str,
        extension: &str,
    ) -> Result<(), Error> {
        let path = directory
            .as_ref()
            .join(format!("{}.{}", base_filename, extension));
        let content = fs::read(&path)
            .map_err(|err| Error::AttachmentNotFound(format!("{}: {}", path.display(), err)))?;
        let size = content.len() as u64;
        let message = self.compose(base_filename, extension, content)?;

        info!(
            "sending {} ({}) via {}:{}",
            path.display(),
            Formatter::format_size(size, 2),
            self.settings.server,
            self.settings.port
        );
        let mut session = Session::open(&self.settings)?;
        if !self.settings.security.is_encrypted() {
            warn!(
                "SMTP_SECURITY is none: credentials for {} are sent unencrypted",
                self.settings.credential.username
            );
        }
        session.authenticate(&self.settings.credential)?;
        session.send(&message)?;
        session.close();
        info!("mail sent to {}", self.settings.credential.username);

        Ok(())
    }

    pub fn compose(
        &self,
        base_filename: &str,
        extension: &str,
        content: Vec<u8>,
    ) -> Result<Message, Error> {
        let file_name = format!("{}.{}", base_filename, extension);
        let username = &self.settings.credential.username;

        let mailbox = username.parse::<Mailbox>().map_err(|err| {
            Error::SendFailed(format!("invalid address '{}': {}", username, err))
        })?;
        let content_type = ContentType::parse("application/octet-stream")
            .map_err(|err| Error::SendFailed(format!("{:?}", err)))?;
        let body = Body::new_with_encoding(content, ContentTransferEncoding::Base64)
            .map_err(|_| Error::SendFailed(String::from("unable to encode attachment")))?;
        let attachment = Attachment::new(file_name.clone()).body(body, content_type);

        Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(format!("Compressed archive: {}", file_name))
            .multipart(MultiPart::mixed().singlepart(attachment))
            .map_err(|err| Error::SendFailed(format!("{}", err)))
    }
}
