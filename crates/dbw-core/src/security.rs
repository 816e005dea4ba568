use crate::domain::ChatId;

// ============== Authorization ==============

/// Single-operator access control: only the configured conversation may issue
/// commands. Everything else is dropped without a reply.
pub fn is_operator(chat_id: Option<ChatId>, operator: ChatId) -> bool {
    let Some(chat_id) = chat_id else {
        return false;
    };
    chat_id == operator
}
