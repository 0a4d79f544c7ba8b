//! Application services built on the query cache and the actor seam.

mod avatar;
mod chat;
mod error;
mod mutations;
mod notices;

pub use avatar::AvatarManager;
pub use chat::{ChatSession, Delivery, LocalMessage, SendReceipt};
pub use error::AppError;
pub use mutations::{MutationExecutor, MutationKind};
pub use notices::{Notice, NoticeLevel, NoticeLog, NoticeSink};
