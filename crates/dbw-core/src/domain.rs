/// Telegram chat id (numeric). The operator identity is a chat id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Blocking status of one domain, as reported by the remote status API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainStatus {
    pub domain: String,
    pub blocked: bool,
}

impl DomainStatus {
    pub fn new(domain: impl Into<String>, blocked: bool) -> Self {
        Self {
            domain: domain.into(),
            blocked,
        }
    }
}
