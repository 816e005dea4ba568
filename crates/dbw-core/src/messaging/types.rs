use crate::domain::ChatId;

/// Transport-neutral inbound command.
///
/// `name` is lower-cased without the leading `/` or any `@botname` suffix,
/// and empty when the text is not a command at all; `args` is the trimmed
/// trailing text (possibly empty).
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub username: Option<String>,
    pub name: String,
    pub args: String,
}

impl Command {
    /// Parse raw message text. Only text starting with `/` is a command;
    /// anything else gets an empty `name`, which the dispatcher treats as
    /// unknown.
    pub fn parse(chat_id: ChatId, username: Option<String>, text: &str) -> Self {
        let Some(body) = text.trim().strip_prefix('/') else {
            return Self {
                chat_id,
                username,
                name: String::new(),
                args: String::new(),
            };
        };

        // Telegram may send `/cmd@botname arg1 ...`
        let mut parts = body.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim().to_string();

        let name = first.split('@').next().unwrap_or("").to_lowercase();

        Self {
            chat_id,
            username,
            name,
            args,
        }
    }
}

/// Limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// Longest accepted message, in UTF-16 code units.
    pub max_message_len: usize,
}
