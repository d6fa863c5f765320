pub mod chats;
pub mod drain;
pub mod health;
pub mod messages;
pub mod subscribe;
