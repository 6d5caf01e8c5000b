pub mod event;
pub mod feed;
pub mod item;
pub mod line;

pub use event::Event;
pub use feed::Feed;
pub use item::FeedItem;
pub use line::{nick_of, BuildError, Line, LineBuilder};
