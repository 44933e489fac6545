//! Chat history
//!
//! An ordered sequence of messages that forms the LLM conversation context.
//! Every operation returns a new history; nothing mutates in place, so a
//! long-lived base history can be shared while each stage derives its own
//! scratch history from it.

use serde::{Deserialize, Serialize};
use std::ops::Add;

use super::message::{Message, Role};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    messages: Vec<Message>,
}

impl ChatHistory {
    /// An empty history
    pub fn empty() -> Self {
        Self::default()
    }

    /// A history holding a single message
    pub fn from_message(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }

    /// A new history with `message` after the existing messages
    pub fn append(&self, message: Message) -> Self {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.extend(self.messages.iter().cloned());
        messages.push(message);
        Self { messages }
    }

    /// A new history with this history followed by `other`
    pub fn concat(&self, other: &ChatHistory) -> Self {
        let mut messages = Vec::with_capacity(self.messages.len() + other.messages.len());
        messages.extend(self.messages.iter().cloned());
        messages.extend(other.messages.iter().cloned());
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the first system message, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role() == Role::System)
            .map(Message::content)
    }
}

impl Add<&ChatHistory> for &ChatHistory {
    type Output = ChatHistory;

    fn add(self, rhs: &ChatHistory) -> ChatHistory {
        self.concat(rhs)
    }
}

impl From<Vec<Message>> for ChatHistory {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl FromIterator<Message> for ChatHistory {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChatHistory {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_insertion_order() {
        let empty = ChatHistory::empty();
        let m1 = Message::user("first");
        let m2 = Message::assistant("second");

        let history = empty.append(m1.clone()).append(m2.clone());

        assert_eq!(history.messages(), &[m1, m2]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_concat_leaves_operands_untouched() {
        let a = ChatHistory::from_message(Message::user("m1"));
        let b = ChatHistory::from_message(Message::assistant("m2"));

        let joined = a.concat(&b);
        assert_eq!(
            joined.messages(),
            &[Message::user("m1"), Message::assistant("m2")]
        );

        // Deriving more state from the operands does not reach the result
        let _a2 = a.append(Message::user("later"));
        let _b2 = b.append(Message::user("later"));
        assert_eq!(joined.len(), 2);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_add_operator_matches_concat() {
        let a = ChatHistory::from_message(Message::system("sys"));
        let b = ChatHistory::from_message(Message::user("hello"));
        assert_eq!(&a + &b, a.concat(&b));
    }

    #[test]
    fn test_system_prompt_lookup() {
        let history: ChatHistory = vec![Message::system("be helpful"), Message::user("hi")].into();
        assert_eq!(history.system_prompt(), Some("be helpful"));
        assert_eq!(ChatHistory::empty().system_prompt(), None);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let history = ChatHistory::from_message(Message::user("hi"));
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(json, r#"[{"role":"user","content":"hi"}]"#);
    }
}
