//! Caller capabilities.
//!
//! Authorization happens before a request reaches the content service. The
//! layer that performs it hands the service one of these tokens; the service
//! takes possession of a token as proof and never re-checks it.

/// Identity of an authorized caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

/// Permission to read content
#[derive(Debug, Clone)]
pub struct ReadAccess {
    caller: Caller,
}

impl ReadAccess {
    /// Issue read access to an already-authorized caller
    pub fn granted(user_id: impl Into<String>) -> Self {
        Self {
            caller: Caller {
                user_id: user_id.into(),
            },
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}

/// Permission to add and delete content. Implies read access.
#[derive(Debug, Clone)]
pub struct WriteAccess {
    caller: Caller,
}

impl WriteAccess {
    /// Issue write access to an already-authorized caller
    pub fn granted(user_id: impl Into<String>) -> Self {
        Self {
            caller: Caller {
                user_id: user_id.into(),
            },
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    /// Read access for the same caller
    pub fn read(&self) -> ReadAccess {
        ReadAccess {
            caller: self.caller.clone(),
        }
    }
}
