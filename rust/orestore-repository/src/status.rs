use orestore_common::Error;

/// Coarse outcome class of a failed retrieval, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    NotFound,
    ServerError,
}

impl StatusClass {
    pub fn of(error: &Error) -> StatusClass {
        if error.is_not_found() {
            StatusClass::NotFound
        } else {
            StatusClass::ServerError
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::NotFound => 404,
            StatusClass::ServerError => 500,
        }
    }
}
