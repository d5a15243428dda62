//! A transport bound to one instance's credentials and deadline.

use std::time::Duration;

use cqforge_core::Credentials;
use cqforge_http::{HttpResponse, Transport};

use crate::error::ReconcileError;

/// Everything a pass needs to talk to one instance.
#[derive(Debug, Clone)]
pub struct Session<T> {
    transport: T,
    auth: Credentials,
    deadline: Option<Duration>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, auth: Credentials, deadline: Option<Duration>) -> Self {
        Self {
            transport,
            auth,
            deadline,
        }
    }

    pub fn get(&self, path: &str) -> Result<HttpResponse, ReconcileError> {
        Ok(self.transport.get(path, &self.auth, self.deadline)?)
    }

    pub fn post(&self, path: &str, form: &[(String, String)]) -> Result<HttpResponse, ReconcileError> {
        Ok(self
            .transport
            .multipart_post(path, &self.auth, form, self.deadline)?)
    }
}
