use std::fmt;

#[derive(Clone, PartialEq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new<S: Into<String>, P: Into<String>>(username: S, password: P) -> Credential {
        Credential {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn debug_output_hides_the_password() {
        let credential = Credential::new("me@example.com", "hunter2");
        let output = format!("{:?}", credential);

        assert!(output.contains("me@example.com"));
        assert!(!output.contains("hunter2"));
    }
}
