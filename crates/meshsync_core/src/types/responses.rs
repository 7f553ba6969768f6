use serde::{Deserialize, Serialize};

/// Host answer to a query request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub text: Vec<String>,
}

impl ResponseMessage {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: lines.into_iter().map(Into::into).collect(),
        }
    }
}
