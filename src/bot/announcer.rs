use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::ChanfeedError;
use crate::connection::Outbound;
use crate::domain::FeedItem;

/// Announcement text for one item: `<title> - <link>`.
pub fn announcement(item: &FeedItem) -> String {
    format!("{} - {}", item.display_title(), item.link)
}

/// Announces every item received on `items` in `channel`, pausing `delay`
/// before each one.
pub async fn announce(
    outbound: Outbound,
    channel: String,
    mut items: mpsc::Receiver<FeedItem>,
    delay: Duration,
) {
    while let Some(item) = items.recv().await {
        tokio::time::sleep(delay).await;

        info!(channel = %channel, title = item.display_title(), "Announcing");
        match outbound.privmsg(&channel, &announcement(&item)).await {
            Ok(()) => {}
            Err(ChanfeedError::EngineGone) => return,
            Err(e) => warn!(
                channel = %channel,
                id = item.identity(),
                error = %e,
                "Dropping unannounceable item"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::JoinHandle;

    use crate::domain::Line;

    fn item(title: &str, link: &str) -> FeedItem {
        FeedItem {
            title: title.into(),
            link: link.into(),
            guid: "g".into(),
            ..Default::default()
        }
    }

    fn spawn_announcer(
        channel: &str,
    ) -> (mpsc::Sender<FeedItem>, mpsc::Receiver<Line>, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(announce(
            Outbound::new(cmd_tx),
            channel.into(),
            rx,
            Duration::ZERO,
        ));
        (tx, cmd_rx, task)
    }

    #[test]
    fn test_announcement_format() {
        assert_eq!(
            announcement(&item("Rust 2.0", "https://example.com/r2")),
            "Rust 2.0 - https://example.com/r2"
        );
        assert_eq!(
            announcement(&item("", "https://b.example/")),
            "(Untitled) - https://b.example/"
        );
    }

    #[tokio::test]
    async fn test_announce_sends_each_item() {
        let (tx, mut cmd_rx, task) = spawn_announcer("#news");

        tx.send(item("A", "https://a.example/")).await.unwrap();
        tx.send(item("two\r\nlines", "https://b.example/")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(
            cmd_rx.recv().await.unwrap().to_string(),
            "PRIVMSG #news :A - https://a.example/"
        );
        assert_eq!(
            cmd_rx.recv().await.unwrap().to_string(),
            "PRIVMSG #news :twolines - https://b.example/"
        );
    }

    #[tokio::test]
    async fn test_unbuildable_announcement_is_dropped() {
        let (tx, mut cmd_rx, task) = spawn_announcer(":news");

        tx.send(item("A", "https://a.example/")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert!(cmd_rx.try_recv().is_err());
    }
}
